//! Azure REST clients: ARM, blob storage, SAS signing, Static Web Apps

pub mod blob;
pub mod rest;
pub mod sas;
pub mod swa;

pub use blob::BlobClient;
pub use rest::ArmClient;
pub use sas::{blob_sas_url, SasRequest, UserDelegationKey};
pub use swa::{StaticSite, SwaClient};
