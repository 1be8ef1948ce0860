//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ddsconf::{EditorConfig, EditorSession, SchemaRegistry};

pub const CYCLONE_DOMAIN_ONLY: &str = r#"<CycloneDDS><Domain Id="5"/></CycloneDDS>"#;

pub const CYCLONE_PEERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CycloneDDS xmlns="https://cdds.io/config">
  <Domain Id="any">
    <General>
      <DontRoute>false</DontRoute>
      <MulticastTimeToLive>8</MulticastTimeToLive>
    </General>
    <Discovery>
      <Peers>
        <Peer address="10.0.0.1"/>
        <Peer address="10.0.0.2"/>
      </Peers>
    </Discovery>
  </Domain>
</CycloneDDS>
"#;

pub const CYCLONE_SINGLE_PEER: &str = r#"<CycloneDDS>
  <Domain Id="0">
    <Discovery><Peers><Peer address="192.168.1.10"/></Peers></Discovery>
  </Domain>
</CycloneDDS>"#;

pub const FASTDDS_ONE_PARTICIPANT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dds>
  <profiles xmlns="http://www.eprosima.com">
    <transport_descriptors>
      <transport_descriptor>
        <transport_id>udp_transport</transport_id>
        <type>UDPv4</type>
        <interfaceWhiteList>
          <address>127.0.0.1</address>
        </interfaceWhiteList>
      </transport_descriptor>
    </transport_descriptors>
    <participant profile_name="participant_a" is_default_profile="true">
      <domainId>3</domainId>
      <rtps>
        <userTransports>
          <transport_id>udp_transport</transport_id>
        </userTransports>
        <useBuiltinTransports>false</useBuiltinTransports>
      </rtps>
    </participant>
  </profiles>
</dds>
"#;

pub const ZENOH_JSON5: &str =
    r#"{mode: "peer", /* comment */ connect: {endpoints: ["tcp/localhost:7447",],},}"#;

pub fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::load().unwrap())
}

/// A session that writes XML without a declaration.
pub fn session() -> EditorSession {
    EditorSession::new(
        registry(),
        EditorConfig {
            xml_declaration: false,
            ..EditorConfig::default()
        },
    )
}
