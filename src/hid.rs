//! Stream Deck access through hidapi.

use hidapi::{HidApi, HidDevice};
use tracing::debug;

use crate::control_msg::Brightness;
use crate::error::DeviceError;
use crate::panel::Panel;
use crate::streamdeck::{parse_firmware_version, DeviceSelector, Model, Protocol};

/// An attached device as seen during enumeration.
#[derive(Clone, Debug)]
pub struct DeviceSummary {
    pub model: Model,
    pub serial: Option<String>,
    pub path: String,
}

pub fn list_devices() -> Result<Vec<DeviceSummary>, DeviceError> {
    let api = HidApi::new()?;
    let all = DeviceSelector::default();
    let devices = api
        .device_list()
        .filter_map(|di| {
            let path = di.path().to_string_lossy().into_owned();
            all.matches(di.vendor_id(), di.product_id(), di.serial_number(), &path)
                .map(|model| DeviceSummary {
                    model,
                    serial: di.serial_number().map(str::to_string),
                    path,
                })
        })
        .collect();
    return Ok(devices);
}

pub struct StreamDeck {
    hw: HidDevice,
    model: Model,
    serial: Option<String>,
}

impl StreamDeck {
    /// Opens the first attached device accepted by `selector`.
    pub fn open(selector: &DeviceSelector) -> Result<StreamDeck, DeviceError> {
        let api = HidApi::new()?;
        let (info, model) = api
            .device_list()
            .find_map(|di| {
                let path = di.path().to_string_lossy();
                selector
                    .matches(di.vendor_id(), di.product_id(), di.serial_number(), &path)
                    .map(|model| (di, model))
            })
            .ok_or(DeviceError::DeviceNotFound)?;
        let hw = info.open_device(&api)?;
        debug!(%model, path = %info.path().to_string_lossy(), "opened stream deck");
        return Ok(StreamDeck {
            hw,
            model,
            serial: info.serial_number().map(str::to_string),
        });
    }

    pub fn model(&self) -> Model {
        self.model
    }

    fn protocol(&self) -> Protocol {
        self.model.protocol()
    }

    fn send(&self, report: &[u8]) -> Result<(), DeviceError> {
        self.hw.send_feature_report(report)?;
        Ok(())
    }
}

impl Panel for StreamDeck {
    fn set_brightness(&mut self, brightness: Brightness) -> Result<(), DeviceError> {
        let report = self.protocol().brightness_report(brightness.percent())?;
        self.send(&report)
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        let report = self.protocol().reset_report()?;
        self.send(&report)
    }

    fn firmware_version(&mut self) -> Result<String, DeviceError> {
        let protocol = self.protocol();
        let mut buf = vec![0u8; protocol.report_len()];
        buf[0] = protocol.firmware_report_id();
        let n = self.hw.get_feature_report(&mut buf)?;
        Ok(parse_firmware_version(protocol, &buf[..n]))
    }

    fn describe(&self) -> String {
        match &self.serial {
            Some(serial) => format!("stream deck {} ({})", self.model, serial),
            None => format!("stream deck {}", self.model),
        }
    }
}
