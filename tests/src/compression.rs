#![cfg(test)]
use echoscan_common::network::compress::compress;
use echoscan_common::network::target::expand;
use echoscan_core::report;

use crate::support::ips;

const NO_CAP: usize = usize::MAX;

#[test]
fn expanded_range_compresses_back_to_itself() {
    for token in ["192.168.1.1-10", "10.0.0.250-10.0.1.5", "172.16.0.7"] {
        let addrs = expand(token, NO_CAP).unwrap();
        assert_eq!(compress(&addrs), token);
    }
}

#[test]
fn cidr_compresses_to_host_span() {
    let addrs = expand("10.0.0.0/23", NO_CAP).unwrap();
    assert_eq!(addrs.len(), 510);
    assert_eq!(compress(&addrs), "10.0.0.1-10.0.1.254");
}

#[test]
fn third_octet_range_leaves_gaps_between_subnets() {
    let addrs = expand("192.168.1-2", NO_CAP).unwrap();
    assert_eq!(compress(&addrs), "192.168.1.1-254, 192.168.2.1-254");
}

#[test]
fn comma_list_order_does_not_matter() {
    let addrs = expand("192.168.5.9,1-3,5", NO_CAP).unwrap();
    assert_eq!(compress(&addrs), "192.168.5.1-3, 192.168.5.5, 192.168.5.9");
}

#[test]
fn online_offline_lines_use_compression() {
    let online = ips(&["10.0.0.3", "10.0.0.1", "10.0.0.2", "fd00::1"]);
    assert_eq!(report::online_line(&online), "Online (4): 10.0.0.1-3, fd00::1");
    assert_eq!(report::offline_line(&[]), "Offline (0): (none)");
}

#[test]
fn small_cidr_compresses_to_its_hosts() {
    let addrs = expand("192.168.1.0/30", NO_CAP).unwrap();
    assert_eq!(compress(&addrs), "192.168.1.1-2");
}
