// Policy set endpoints
//
// Only what rule detachment needs: resolve the set for a policy type,
// list its rules, and write a rule back.

use crate::client::ZpaClient;
use crate::error::Error;
use crate::models::{PolicyRule, PolicySet};

impl ZpaClient {
    /// `GET policySet/policyType/{type}`
    pub async fn get_policy_set(&self, policy_type: &str) -> Result<PolicySet, Error> {
        self.get(&format!("policySet/policyType/{policy_type}"))
            .await
    }

    /// `GET policySet/rules/policyType/{type}`, all pages.
    pub async fn list_policy_rules(&self, policy_type: &str) -> Result<Vec<PolicyRule>, Error> {
        self.get_all_pages(&format!("policySet/rules/policyType/{policy_type}"), None)
            .await
    }

    /// `PUT policySet/{setId}/rule/{ruleId}`
    pub async fn update_policy_rule(
        &self,
        policy_set_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> Result<(), Error> {
        self.put(&format!("policySet/{policy_set_id}/rule/{rule_id}"), rule)
            .await
    }
}
