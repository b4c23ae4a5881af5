//! Lives in its own test crate: a second `export_plugin!` invocation in the
//! lib's unit tests would redefine the `#[no_mangle]` entry-point symbols.

use plughost_api::{Plugin, PluginOwner};

mod panicking {
    pub struct Panicking;

    impl plughost_api::Plugin for Panicking {}

    impl plughost_api::PluginFactory for Panicking {
        fn create(_owner: &plughost_api::PluginOwner) -> Option<Self> {
            panic!("no display server");
        }
    }

    plughost_api::export_plugin!(Panicking);
}

#[test]
fn test_exported_factory_panic_unwinds_to_caller() {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let owner = PluginOwner::new("panicking", 1, tx);
    let create: extern "C-unwind" fn(*const PluginOwner) -> *mut dyn Plugin =
        panicking::_plughost_plugin_create;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| create(&owner)));
    assert!(result.is_err());
}
