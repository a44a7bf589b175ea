// Application segment endpoints
//
// Standard, browser-access and inspection segments all live under
// `application`; they differ only in which fields the body carries.

use crate::client::ZpaClient;
use crate::error::Error;
use crate::models::{AppSegmentInspection, ApplicationSegment, BrowserAccess, ShareRequest};

const ENDPOINT: &str = "application";

impl ZpaClient {
    // ── Standard segments ────────────────────────────────────────────

    pub async fn get_application_segment(&self, id: &str) -> Result<ApplicationSegment, Error> {
        self.get(&format!("{ENDPOINT}/{id}")).await
    }

    pub async fn get_application_segment_by_name(
        &self,
        name: &str,
    ) -> Result<ApplicationSegment, Error> {
        let segments: Vec<ApplicationSegment> = self.get_all_pages(ENDPOINT, Some(name)).await?;
        segments
            .into_iter()
            .find(|s| s.base.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::NotFound {
                resource: "application segment",
                name: name.into(),
            })
    }

    pub async fn create_application_segment(
        &self,
        segment: &ApplicationSegment,
    ) -> Result<ApplicationSegment, Error> {
        self.post(ENDPOINT, segment).await
    }

    pub async fn update_application_segment(
        &self,
        id: &str,
        segment: &ApplicationSegment,
    ) -> Result<(), Error> {
        self.put(&format!("{ENDPOINT}/{id}"), segment).await
    }

    /// Share a segment with other microtenants.
    pub async fn share_application_segment(
        &self,
        id: &str,
        request: &ShareRequest,
    ) -> Result<(), Error> {
        self.put(&format!("{ENDPOINT}/{id}/share"), request).await
    }

    /// Delete any application segment flavour.
    pub async fn delete_application_segment(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("{ENDPOINT}/{id}")).await
    }

    // ── Browser access ───────────────────────────────────────────────

    pub async fn get_browser_access(&self, id: &str) -> Result<BrowserAccess, Error> {
        self.get(&format!("{ENDPOINT}/{id}")).await
    }

    pub async fn get_browser_access_by_name(&self, name: &str) -> Result<BrowserAccess, Error> {
        let apps: Vec<BrowserAccess> = self.get_all_pages(ENDPOINT, Some(name)).await?;
        apps.into_iter()
            .find(|a| a.base.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::NotFound {
                resource: "browser access application",
                name: name.into(),
            })
    }

    pub async fn create_browser_access(&self, app: &BrowserAccess) -> Result<BrowserAccess, Error> {
        self.post(ENDPOINT, app).await
    }

    pub async fn update_browser_access(&self, id: &str, app: &BrowserAccess) -> Result<(), Error> {
        self.put(&format!("{ENDPOINT}/{id}"), app).await
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub async fn get_inspection_segment(&self, id: &str) -> Result<AppSegmentInspection, Error> {
        self.get(&format!("{ENDPOINT}/{id}")).await
    }

    pub async fn get_inspection_segment_by_name(
        &self,
        name: &str,
    ) -> Result<AppSegmentInspection, Error> {
        let segments: Vec<AppSegmentInspection> =
            self.get_all_pages(ENDPOINT, Some(name)).await?;
        segments
            .into_iter()
            .find(|s| s.base.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::NotFound {
                resource: "inspection application segment",
                name: name.into(),
            })
    }

    pub async fn create_inspection_segment(
        &self,
        segment: &AppSegmentInspection,
    ) -> Result<AppSegmentInspection, Error> {
        self.post(ENDPOINT, segment).await
    }

    pub async fn update_inspection_segment(
        &self,
        id: &str,
        segment: &AppSegmentInspection,
    ) -> Result<(), Error> {
        self.put(&format!("{ENDPOINT}/{id}"), segment).await
    }
}
