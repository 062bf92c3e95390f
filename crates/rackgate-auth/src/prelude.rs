pub use crate::acl::{
    authorize, has_role, roles::builtin_role_parents, AclService, AuthorizationService,
    PolicyStore, RoleHierarchy,
};
pub use crate::authn::{
    local::{
        generate_salt, hash_password, hash_password_with, BasicAuthenticator, LocalUserStore,
        DEFAULT_HASH_ITERATIONS,
    },
    session::{RedfishAuthenticator, Session, SessionRegistry},
    token::{JwtAuthenticator, TokenClaims, TokenIssuer},
    Authenticator, AuthenticatorSet,
};
pub use crate::errors::AuthError;
pub use crate::model::{AuthnInput, Caller, LocalUser, ResourceGrant};
