use std::thread;

use attrscope_core::engine::{
    AttributeValue, DiagnosticKind, FieldSpec, SharedTemplateCache, SourceKey, Template,
};
use attrscope_core::protocols::netflow::NetflowSession;

fn packet(flowset_id: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&9u16.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&flowset_id.to_be_bytes());
    bytes.extend_from_slice(&((4 + body.len()) as u16).to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// Template 300 with `count` IN_PKTS fields of 4 bytes each.
fn template_packet(count: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&300u16.to_be_bytes());
    body.extend_from_slice(&count.to_be_bytes());
    for _ in 0..count {
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&4u16.to_be_bytes());
    }
    packet(0, &body)
}

#[test]
fn exporters_sharing_a_session_keep_their_own_layouts() {
    let session = NetflowSession::new();

    thread::scope(|s| {
        for exporter in 1u16..=4 {
            let session = session.clone();
            s.spawn(move || {
                let name = format!("198.51.100.{exporter}");
                let defined = session
                    .decode_packet(&name, &template_packet(exporter))
                    .expect("template framing");
                assert!(defined.output.diagnostics.is_empty());

                let values: Vec<u8> = (0..u32::from(exporter))
                    .flat_map(|i| (i + 1).to_be_bytes())
                    .collect();
                for _ in 0..50 {
                    let data = session
                        .decode_packet(&name, &packet(300, &values))
                        .expect("data framing");
                    assert!(data.output.diagnostics.is_empty(), "{:?}", data.output.diagnostics);
                    let record = &data.output.tree[0].children[0];
                    assert_eq!(record.children.len(), usize::from(exporter));
                    let last = record.children.last().map(|a| &a.value);
                    assert_eq!(last, Some(&AttributeValue::Unsigned(u64::from(exporter))));
                }
            });
        }
    });

    assert_eq!(session.templates().len(), 4);
    let stranger = session
        .decode_packet("203.0.113.1", &packet(300, &[0; 4]))
        .expect("framing");
    assert_eq!(stranger.output.count(DiagnosticKind::UnresolvedTemplate), 1);
}

#[test]
fn readers_never_observe_a_partial_redefinition() {
    let cache = SharedTemplateCache::new();
    let source = SourceKey::new("192.0.2.1");
    let layout = |width: u16| vec![FieldSpec::new(2, width); usize::from(width)];
    cache.insert(Template::new(9, source.clone(), layout(1)).expect("template"));

    thread::scope(|s| {
        let writer_cache = cache.clone();
        let writer_source = source.clone();
        s.spawn(move || {
            for round in 0..500u16 {
                let width = if round % 2 == 0 { 4 } else { 1 };
                let template =
                    Template::new(9, writer_source.clone(), layout(width)).expect("template");
                writer_cache.insert(template);
            }
        });

        for _ in 0..3 {
            let reader_cache = cache.clone();
            let reader_source = source.clone();
            s.spawn(move || {
                for _ in 0..500 {
                    let template = reader_cache
                        .lookup(9, &reader_source)
                        .expect("template stays registered");
                    let width = template.fields[0].length;
                    assert_eq!(template.fields.len(), usize::from(width));
                    assert!(template.fields.iter().all(|f| f.length == width));
                    assert_eq!(template.record_len, usize::from(width) * usize::from(width));
                }
            });
        }
    });

    assert_eq!(cache.len(), 1);
}

#[test]
fn reset_clears_templates_for_every_clone() {
    let session = NetflowSession::new();
    let other = session.clone();
    session
        .decode_packet("192.0.2.1", &template_packet(1))
        .expect("framing");
    assert_eq!(other.templates().len(), 1);

    other.reset();
    assert!(session.templates().is_empty());
    let data = session
        .decode_packet("192.0.2.1", &packet(300, &[0, 0, 0, 1]))
        .expect("framing");
    assert_eq!(data.output.count(DiagnosticKind::UnresolvedTemplate), 1);
}
