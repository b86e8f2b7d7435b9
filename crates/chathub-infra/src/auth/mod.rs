//! Bearer token validation for the configured identity provider.

pub mod azure_ad;

pub use azure_ad::AzureAdValidator;
