// ── Provider handle ──
//
// One connected tenant, handing out a lifecycle service per resource type.

use zpa_api::ZpaClient;

use crate::config::ProviderConfig;
use crate::error::CoreError;
use crate::lifecycle::ResourceService;
use crate::remote::Remote;
use crate::resources::{
    ApplicationSegmentResource, BrowserAccessResource, InspectionResource, SegmentGroupResource,
};

/// Entry point for consumers.
///
/// Cheap to clone. Generic over the remote so tests can swap in a double.
#[derive(Debug, Clone)]
pub struct Provider<R = ZpaClient> {
    remote: R,
    default_microtenant: Option<String>,
}

impl Provider<ZpaClient> {
    /// Build a client from `config`. Sign-in happens on the first call.
    pub fn connect(config: &ProviderConfig) -> Result<Self, CoreError> {
        let client = config.connect()?;
        Ok(Self::new(client).with_default_microtenant(config.microtenant_id.clone()))
    }
}

impl<R: Remote> Provider<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            default_microtenant: None,
        }
    }

    pub fn with_default_microtenant(mut self, microtenant_id: Option<String>) -> Self {
        self.default_microtenant = microtenant_id;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn service<M: crate::resources::Resource>(&self) -> ResourceService<M, R> {
        ResourceService::new(self.remote.clone())
            .with_default_microtenant(self.default_microtenant.clone())
    }

    pub fn segment_groups(&self) -> ResourceService<SegmentGroupResource, R> {
        self.service()
    }

    pub fn application_segments(&self) -> ResourceService<ApplicationSegmentResource, R> {
        self.service()
    }

    pub fn browser_access_segments(&self) -> ResourceService<BrowserAccessResource, R> {
        self.service()
    }

    pub fn inspection_segments(&self) -> ResourceService<InspectionResource, R> {
        self.service()
    }
}
