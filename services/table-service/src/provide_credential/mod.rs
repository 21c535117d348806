mod env;
pub use env::EnvCredentialProvider;

mod static_provider;
pub use static_provider::StaticCredentialProvider;

mod client_secret;
pub use client_secret::ClientSecretCredentialProvider;

mod workload_identity;
pub use workload_identity::WorkloadIdentityCredentialProvider;

mod imds;
pub use imds::ImdsCredentialProvider;

mod azure_cli;
pub use azure_cli::AzureCliCredentialProvider;

mod device_code;
pub use device_code::DeviceCodeCredentialProvider;

mod default;
pub use default::DefaultCredentialProvider;
