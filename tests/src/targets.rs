#![cfg(test)]
use echoscan_common::config::{FamilyPreference, TargetOptions};
use echoscan_common::error::TargetError;
use echoscan_common::network::address::AddressFamily;
use echoscan_core::targets::build_target_set;

use crate::support::{StaticResolver, ip, ips, strings};

fn resolver() -> StaticResolver {
    StaticResolver::default()
        .with_host("router.lan", &["192.168.1.1"])
        .with_host("dual.lan", &["10.1.1.1", "fd00::1"])
}

#[tokio::test]
async fn hostnames_and_ranges_in_argument_order() {
    let args = strings(&["router.lan", "10.0.0.1-3", "2001:db8::1"]);
    let targets = build_target_set(&args, &[], &resolver(), &TargetOptions::default()).await.unwrap();
    assert_eq!(
        targets,
        ips(&["192.168.1.1", "10.0.0.1", "10.0.0.2", "10.0.0.3", "2001:db8::1"])
    );
}

#[tokio::test]
async fn comma_separated_argument_holds_several_targets() {
    let args = strings(&["router.lan,10.0.0.7", "10.0.1.1,3"]);
    let targets = build_target_set(&args, &[], &resolver(), &TargetOptions::default()).await.unwrap();
    assert_eq!(targets, ips(&["192.168.1.1", "10.0.0.7", "10.0.1.1", "10.0.1.3"]));
}

#[tokio::test]
async fn resolved_addresses_follow_forced_family() {
    let args = strings(&["dual.lan"]);
    let options = TargetOptions { family: FamilyPreference::V6Only, ..TargetOptions::default() };
    let targets = build_target_set(&args, &[], &resolver(), &options).await.unwrap();
    assert_eq!(targets, ips(&["fd00::1"]));
}

#[tokio::test]
async fn host_without_addresses_of_forced_family_fails() {
    let args = strings(&["router.lan"]);
    let options = TargetOptions { family: FamilyPreference::V6Only, ..TargetOptions::default() };
    let err = build_target_set(&args, &[], &resolver(), &options).await.unwrap_err();
    assert_eq!(err, TargetError::Resolution { host: "router.lan".into() });
}

#[tokio::test]
async fn literal_against_forced_family_fails() {
    let args = strings(&["::1"]);
    let options = TargetOptions { family: FamilyPreference::V4Only, ..TargetOptions::default() };
    let err = build_target_set(&args, &[], &resolver(), &options).await.unwrap_err();
    assert_eq!(err, TargetError::FamilyMismatch { addr: ip("::1"), family: AddressFamily::V4 });
}

#[tokio::test]
async fn exclusions_accept_ranges_and_hostnames() {
    let args = strings(&["192.168.1.1-6"]);
    let exclude = strings(&["192.168.1.2-3,router.lan", "192.168.1.9"]);
    let targets = build_target_set(&args, &exclude, &resolver(), &TargetOptions::default()).await.unwrap();
    assert_eq!(targets, ips(&["192.168.1.4", "192.168.1.5", "192.168.1.6"]));
}

#[tokio::test]
async fn exclusions_remove_every_duplicate() {
    let args = strings(&["10.0.0.1", "10.0.0.2", "10.0.0.1"]);
    let exclude = strings(&["10.0.0.1"]);
    let targets = build_target_set(&args, &exclude, &resolver(), &TargetOptions::default()).await.unwrap();
    assert_eq!(targets, ips(&["10.0.0.2"]));
}

#[tokio::test]
async fn exclusions_ignore_forced_family() {
    let args = strings(&["10.0.0.1-2"]);
    let exclude = strings(&["fd00::9", "10.0.0.2"]);
    let options = TargetOptions { family: FamilyPreference::V4Only, ..TargetOptions::default() };
    let targets = build_target_set(&args, &exclude, &resolver(), &options).await.unwrap();
    assert_eq!(targets, ips(&["10.0.0.1"]));
}

#[tokio::test]
async fn host_limit_applies_to_merged_set() {
    let args = strings(&["10.0.0.1-3", "10.0.1.1-3"]);
    let options = TargetOptions { max_hosts: 5, ..TargetOptions::default() };
    let err = build_target_set(&args, &[], &resolver(), &options).await.unwrap_err();
    assert_eq!(err, TargetError::CapExceeded { count: 6, max: 5 });

    let forced = TargetOptions { force: true, ..options };
    let targets = build_target_set(&args, &[], &resolver(), &forced).await.unwrap();
    assert_eq!(targets.len(), 6);
}

#[tokio::test]
async fn oversized_single_token_is_truncated_to_limit() {
    let args = strings(&["10.0.0.0/16"]);
    let options = TargetOptions { max_hosts: 100, ..TargetOptions::default() };
    let targets = build_target_set(&args, &[], &resolver(), &options).await.unwrap();
    assert_eq!(targets.len(), 100);
    assert_eq!(targets[0], ip("10.0.0.1"));

    let err = build_target_set(&strings(&["10.0.0.0/16", "10.1.0.1"]), &[], &resolver(), &options)
        .await
        .unwrap_err();
    assert_eq!(err, TargetError::CapExceeded { count: 101, max: 100 });
}

#[tokio::test]
async fn syntax_error_aborts_whole_build() {
    let args = strings(&["10.0.0.1", "10.0.0.300"]);
    let err = build_target_set(&args, &[], &resolver(), &TargetOptions::default()).await.unwrap_err();
    assert!(matches!(err, TargetError::Syntax { ref token, .. } if token == "10.0.0.300"));
}

#[tokio::test]
async fn bad_comma_list_part_fails_whole_token() {
    let args = strings(&["192.168.2.1,300"]);
    let err = build_target_set(&args, &[], &resolver(), &TargetOptions::default()).await.unwrap_err();
    assert!(matches!(err, TargetError::Syntax { ref token, .. } if token == "192.168.2.1,300"));
}

#[tokio::test]
async fn exclusion_wider_than_host_limit_covers_every_address() {
    let args = strings(&["10.200.0.1", "10.255.255.254", "11.0.0.1"]);
    let exclude = strings(&["10.0.0.0/8"]);
    let targets = build_target_set(&args, &exclude, &resolver(), &TargetOptions::default()).await.unwrap();
    assert_eq!(targets, ips(&["11.0.0.1"]));

    let small = TargetOptions { max_hosts: 2, ..TargetOptions::default() };
    let args = strings(&["192.168.1.200"]);
    let err = build_target_set(&args, &strings(&["192.168.1.1-254"]), &resolver(), &small).await.unwrap_err();
    assert_eq!(err, TargetError::NoTargets);
}
