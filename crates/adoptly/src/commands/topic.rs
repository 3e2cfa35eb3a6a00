//! Topic handler: the MQTT topic a device listens on.

use serde::Serialize;

use crate::cli::{GlobalOpts, TopicArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::iface;
use crate::output;

#[derive(Debug, Serialize)]
struct DeviceTopic {
    iface: String,
    mac: String,
    topic: String,
}

pub fn handle(args: &TopicArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let sysfs_root = args.iface.sysfs_root.as_ref().unwrap_or(&cfg.store.sysfs_root);
    let mac = iface::read_mac(sysfs_root, &args.iface.iface)?;
    let info = DeviceTopic {
        iface: args.iface.iface.clone(),
        mac: mac.to_string(),
        topic: iface::device_topic(&cfg.broker.topic_prefix, &mac),
    };

    let out = output::render_single(
        &global.output,
        &info,
        |t| t.topic.clone(),
        |t| t.topic.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
