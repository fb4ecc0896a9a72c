//! Built-in gate stages, in default pipeline order.

pub mod credential_preauth;
pub mod deposit_auth_flag;
pub mod direct_preauth;
pub mod presented_credentials;
pub mod self_delivery;

pub use credential_preauth::CredentialPreauthStage;
pub use deposit_auth_flag::DepositAuthFlagStage;
pub use direct_preauth::DirectPreauthStage;
pub use presented_credentials::PresentedCredentialsStage;
pub use self_delivery::SelfDeliveryStage;
