pub mod provider;

pub use provider::{
    CreateProviderInput, ProviderData, ProviderListQuery, ProviderPage, SetApprovalInput,
    UpdateProviderInput,
};
