// file: src/options.rs
// version: 1.0.0
// guid: 83871a11-8763-495c-9352-fab413fdf2c7

//! Option sets read straight from the answer files

use crate::config::KeyValueFile;
use crate::inventory::{single_choice, ChoiceSet};
use crate::Result;

const MGMT_AZ_KEY: &str = "mgmt_az_name";
const EDGE_IPS_KEY: &str = "nsx_edge_ips";
const COMPUTE_AZ_COUNT_KEY: &str = "compute_az";
const COMPUTE_CLUSTER_COUNT_KEY: &str = "no_compute_cluster_name";
const HOSTS_PER_CLUSTER_KEY: &str = "no_hosts_per_compute_cluster";
const SLOT_USERNAME_KEY: &str = "esxi_host1_username";
const SLOT_PASSWORD_KEY: &str = "esxi_host1_password";

pub fn management_azs(answers: &KeyValueFile) -> ChoiceSet {
    single_choice(answers.get_or_empty(MGMT_AZ_KEY))
}

pub fn edge_hosts(answers: &KeyValueFile) -> ChoiceSet {
    single_choice(answers.get_or_empty(EDGE_IPS_KEY))
}

/// Names of compute availability zones 1..=`compute_az`
pub fn compute_azs(answers: &KeyValueFile, admin: &KeyValueFile) -> Result<ChoiceSet> {
    let count = admin.get_count(COMPUTE_AZ_COUNT_KEY)?;
    Ok((1..=count)
        .map(|n| (answers.get_or_empty(&format!("compute_az_{}_name", n)), String::new()))
        .collect())
}

/// Addresses of every host of every compute cluster
pub fn compute_hosts(answers: &KeyValueFile, admin: &KeyValueFile) -> Result<ChoiceSet> {
    let clusters = admin.get_count(COMPUTE_CLUSTER_COUNT_KEY)?;
    let hosts = admin.get_count(HOSTS_PER_CLUSTER_KEY)?;

    let mut choices = ChoiceSet::new();
    for cluster in 1..=clusters {
        for host in 1..=hosts {
            let key = format!("esxi_compute{}_host{}_ip", cluster, host);
            choices.insert(answers.get_or_empty(&key), String::new());
        }
    }
    Ok(choices)
}

/// SSH login for a numbered management host
#[derive(Clone, PartialEq, Eq)]
pub struct SlotLogin {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SlotLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotLogin")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Address of `esxi_host<slot>_ip`. Every slot logs in with the first
/// host's credentials.
pub fn slot_login(answers: &KeyValueFile, slot: u32) -> SlotLogin {
    SlotLogin {
        host: answers.get_or_empty(&format!("esxi_host{}_ip", slot)),
        username: answers.get_or_empty(SLOT_USERNAME_KEY),
        password: answers.get_or_empty(SLOT_PASSWORD_KEY),
    }
}
