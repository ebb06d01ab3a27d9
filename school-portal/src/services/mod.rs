pub mod error;
pub mod identity;
pub mod metrics;
pub mod razorpay;
pub mod records;

pub use error::ProviderError;
pub use identity::IdentityClient;
pub use metrics::{get_metrics, init_metrics};
pub use razorpay::RazorpayClient;
pub use records::{RecordsClient, TableQuery};
