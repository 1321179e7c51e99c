//! WordPress site connectivity: site registry with credential probing,
//! code deployment through the companion plugin and the WordPress.com
//! OAuth flow.

pub mod deploy;
pub mod endpoints;
pub mod errors;
pub mod oauth;
pub mod registry;

pub use deploy::{CodeType, DeployItem, DeploymentClient};
pub use errors::{
    SiteConnectorConfigError, SiteConnectorError, SiteConnectorResult, UpstreamFailure, body_value,
};
pub use oauth::{AccountSite, AuthorizeUrl, OAuthClient, OAuthConfig, TokenPair};
pub use registry::{InMemorySiteStore, SetupMethod, Site, SiteRegistry, SiteStore, SiteSummary};
