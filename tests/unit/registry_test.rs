//! Tests for the plugin registry

use prometheus_plugin_dispatch::core::{
    FnPlugin, Plugin, PluginId, PluginInfo, PluginRegistry, PluginResult, SharedPlugin,
};
use std::sync::Arc;

fn constant(name: &str, value: u8) -> FnPlugin<impl Fn(&()) -> PluginResult<u8> + Send + Sync> {
    FnPlugin::new(name, move |_: &()| -> PluginResult<u8> { Ok(value) })
}

#[test]
fn test_register_assigns_sequential_ids() {
    let mut registry = PluginRegistry::new();
    assert!(registry.is_empty());

    let first = registry.register(constant("first", 1)).unwrap();
    let second = registry.register(constant("second", 2)).unwrap();

    assert_eq!(first, PluginId(0));
    assert_eq!(second, PluginId(1));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(second).unwrap().handle(&()), Ok(2));
    assert!(registry.get(PluginId(2)).is_none());
}

#[test]
fn test_same_plugin_registered_twice_occupies_two_slots() {
    let shared: SharedPlugin<(), u8> = Arc::new(constant("twice", 9));
    let mut registry = PluginRegistry::new();
    registry.register_shared(Arc::clone(&shared)).unwrap();
    registry.register_shared(shared).unwrap();

    let ids: Vec<PluginId> = registry.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![PluginId(0), PluginId(1)]);
}

#[test]
fn test_infos_and_collect() {
    let registry: PluginRegistry<(), u8> = vec![
        Arc::new(constant("a", 1).with_info(PluginInfo::new("a", "1.2.3"))) as SharedPlugin<(), u8>,
        Arc::new(constant("b", 2)) as SharedPlugin<(), u8>,
    ]
    .into_iter()
    .collect();

    let infos = registry.infos();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].version, "1.2.3");
    assert_eq!(infos[1].name, "b");
    assert_eq!(PluginId(1).to_string(), "#1");
}
