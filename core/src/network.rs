pub mod icmp;
pub mod packet;
