//! Keyboard initialization
//!
//! Given the four arguments passed by the hotplug handler, applies the
//! layout to the new device and the repeat rate to the session.

use crate::config::Config;
use crate::error::{InitError, RunError};
use crate::runner::{CommandRunner, ToolInvocation};

/// Arguments describing the newly attached keyboard, all passed through as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardArgs {
    /// Display name of the keyboard
    pub name: String,
    /// Device node, e.g. /dev/input/event5
    pub device_node: String,
    /// xinput device id, handed to setxkbmap -device
    pub xinput_id: String,
    /// vendor:product as lowercase hex, e.g. 1d50:6122
    pub vendor_product: String,
}

impl KeyboardArgs {
    pub fn new(
        name: impl Into<String>,
        device_node: impl Into<String>,
        xinput_id: impl Into<String>,
        vendor_product: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            device_node: device_node.into(),
            xinput_id: xinput_id.into(),
            vendor_product: vendor_product.into(),
        }
    }

    /// Whether this keyboard already swaps Caps Lock and Escape itself.
    /// Exact string match, no case folding or trimming.
    pub fn swaps_caps_in_firmware(&self, config: &Config) -> bool {
        config
            .layout
            .firmware_swap_devices
            .iter()
            .any(|id| *id == self.vendor_product)
    }

    /// Operator-facing line printed before anything is configured
    pub fn announcement(&self) -> String {
        format!("Initializing keyboard {} ({})", self.name, self.device_node)
    }
}

/// Build the setxkbmap request for this keyboard
pub fn layout_request(args: &KeyboardArgs, config: &Config) -> ToolInvocation {
    let layout = &config.layout;
    let request = ToolInvocation::new(&config.tools.setxkbmap)
        .flag("-device", &args.xinput_id)
        .flag("-layout", layout.layouts.join(","))
        .flag("-option", &layout.toggle_option);

    if args.swaps_caps_in_firmware(config) {
        request
    } else {
        request.flag("-option", &layout.caps_escape_option)
    }
}

/// Build the xset key repeat request
pub fn repeat_request(config: &Config) -> ToolInvocation {
    ToolInvocation::new(&config.tools.xset)
        .arg("r")
        .arg("rate")
        .arg(config.repeat.delay.to_string())
        .arg(config.repeat.rate.to_string())
}

/// Configure a newly attached keyboard.
///
/// Runs the layout request, then the repeat request regardless of how the
/// first one went. Fails if either did; there is no retry or rollback.
pub fn initialize(
    args: &KeyboardArgs,
    config: &Config,
    runner: &dyn CommandRunner,
) -> Result<(), InitError> {
    println!("{}", args.announcement());

    if args.swaps_caps_in_firmware(config) {
        log::info!(
            "{} ({}) swaps Caps Lock/Escape in firmware, not remapping",
            args.name,
            args.vendor_product
        );
    }

    let requests = [layout_request(args, config), repeat_request(config)];
    let failures: Vec<RunError> = requests
        .iter()
        .filter_map(|request| runner.run(request).err())
        .collect();

    if failures.is_empty() {
        log::info!("Keyboard {} configured", args.name);
        Ok(())
    } else {
        for failure in &failures {
            log::error!("{}", failure);
        }
        Err(InitError::ConfigurationFailed(failures))
    }
}
