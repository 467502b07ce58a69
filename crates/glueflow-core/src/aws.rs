//! Shared AWS SDK configuration.

use crate::config::AwsConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

/// Build AWS SDK configuration with credentials.
///
/// `region_override` wins over `config.region`; when both are absent the
/// default region provider chain applies.
pub async fn load_sdk_config(config: &AwsConfig, region_override: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = region_override.or(config.region.as_deref()) {
        loader = loader.region(Region::new(region.to_string()));
    }

    if let (Some(access_key), Some(secret_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        debug!("Using explicit AWS credentials");
        let credentials = aws_credential_types::Credentials::new(
            access_key,
            secret_key,
            None, // session token
            None, // expiry
            "glueflow-explicit-credentials",
        );
        loader = loader.credentials_provider(credentials);
    } else {
        debug!("Using default AWS credential chain");
    }

    if let Some(ref endpoint) = config.endpoint {
        debug!(endpoint = %endpoint, "Using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_region_override_wins() {
        let config = AwsConfig {
            region: Some("eu-west-1".into()),
            access_key_id: Some("test_key".into()),
            secret_access_key: Some("test_secret".into()),
            endpoint: None,
        };

        let sdk = load_sdk_config(&config, Some("us-west-2")).await;
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("us-west-2"));

        let sdk = load_sdk_config(&config, None).await;
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_endpoint_override() {
        let config = AwsConfig {
            region: Some("us-east-1".into()),
            access_key_id: Some("test".into()),
            secret_access_key: Some("test".into()),
            endpoint: Some("http://localhost:4566".into()),
        };

        let sdk = load_sdk_config(&config, None).await;
        assert_eq!(sdk.endpoint_url(), Some("http://localhost:4566"));
    }
}
