// Segment group endpoints
//
// Segment groups bundle application segments for policy purposes.

use crate::client::ZpaClient;
use crate::error::Error;
use crate::models::SegmentGroup;

const ENDPOINT: &str = "segmentGroup";

impl ZpaClient {
    pub async fn get_segment_group(&self, id: &str) -> Result<SegmentGroup, Error> {
        self.get(&format!("{ENDPOINT}/{id}")).await
    }

    /// Case-insensitive exact name lookup.
    pub async fn get_segment_group_by_name(&self, name: &str) -> Result<SegmentGroup, Error> {
        let groups: Vec<SegmentGroup> = self.get_all_pages(ENDPOINT, Some(name)).await?;
        groups
            .into_iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::NotFound {
                resource: "segment group",
                name: name.into(),
            })
    }

    pub async fn list_segment_groups(&self) -> Result<Vec<SegmentGroup>, Error> {
        self.get_all_pages(ENDPOINT, None).await
    }

    pub async fn create_segment_group(&self, group: &SegmentGroup) -> Result<SegmentGroup, Error> {
        self.post(ENDPOINT, group).await
    }

    pub async fn update_segment_group(&self, id: &str, group: &SegmentGroup) -> Result<(), Error> {
        self.put(&format!("{ENDPOINT}/{id}"), group).await
    }

    pub async fn delete_segment_group(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("{ENDPOINT}/{id}")).await
    }
}
