use nu_plugin::{serve_plugin, MsgPackSerializer};
use nu_plugin_dataset::DatasetPlugin;

fn main() {
    serve_plugin(&DatasetPlugin, MsgPackSerializer {})
}
