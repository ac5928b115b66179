//! Device models and the feature report layout spoken by their firmware.

use std::fmt;

use crate::error::DeviceError;

pub const ELGATO_VENDOR_ID: u16 = 0x0fd9;

/// The Stream Deck models we know how to talk to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Model {
    Original,
    OriginalV2,
    Mini,
    Xl,
    Mk2,
    RevisedMini,
}

/// Firmware protocol revision. Determines report sizes and command bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    V1,
    V2,
}

impl Model {
    pub const ALL: [Model; 6] = [
        Model::Original,
        Model::OriginalV2,
        Model::Mini,
        Model::Xl,
        Model::Mk2,
        Model::RevisedMini,
    ];

    pub fn product_id(&self) -> u16 {
        match self {
            Model::Original => 0x0060,
            Model::OriginalV2 => 0x006d,
            Model::Mini => 0x0063,
            Model::Xl => 0x006c,
            Model::Mk2 => 0x0080,
            Model::RevisedMini => 0x0090,
        }
    }

    pub fn from_product_id(product_id: u16) -> Option<Model> {
        Model::ALL
            .iter()
            .copied()
            .find(|model| model.product_id() == product_id)
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Model::Original | Model::Mini | Model::RevisedMini => Protocol::V1,
            Model::OriginalV2 | Model::Xl | Model::Mk2 => Protocol::V2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Model::Original => "original",
            Model::OriginalV2 => "original-v2",
            Model::Mini => "mini",
            Model::Xl => "xl",
            Model::Mk2 => "mk2",
            Model::RevisedMini => "revised-mini",
        }
    }

    pub fn from_string(name: &str) -> Result<Model, DeviceError> {
        let lowered = name.trim().to_ascii_lowercase();
        Model::ALL
            .iter()
            .copied()
            .find(|model| model.name() == lowered)
            .ok_or_else(|| DeviceError::UnknownModel(name.to_string()))
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::from_string(s).map_err(|e| e.to_string())
    }
}

impl Protocol {
    /// Length of every feature report, including the report id.
    pub fn report_len(&self) -> usize {
        match self {
            Protocol::V1 => 17,
            Protocol::V2 => 32,
        }
    }

    pub fn brightness_command(&self) -> &'static [u8] {
        match self {
            Protocol::V1 => &[0x05, 0x55, 0xaa, 0xd1, 0x01],
            Protocol::V2 => &[0x03, 0x08],
        }
    }

    pub fn reset_command(&self) -> &'static [u8] {
        match self {
            Protocol::V1 => &[0x0b, 0x63],
            Protocol::V2 => &[0x03, 0x02],
        }
    }

    /// Report id to request with `get_feature_report` for the firmware version.
    pub fn firmware_report_id(&self) -> u8 {
        match self {
            Protocol::V1 => 0x04,
            Protocol::V2 => 0x05,
        }
    }

    /// Offset of the ASCII version string inside the firmware report.
    pub fn firmware_version_offset(&self) -> usize {
        match self {
            Protocol::V1 => 5,
            Protocol::V2 => 6,
        }
    }

    pub fn brightness_report(&self, percent: u8) -> Result<Vec<u8>, DeviceError> {
        build_report(*self, self.brightness_command(), &[percent.min(100)])
    }

    pub fn reset_report(&self) -> Result<Vec<u8>, DeviceError> {
        build_report(*self, self.reset_command(), &[])
    }
}

/// Picks one device out of everything attached. Unset fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceSelector {
    pub model: Option<Model>,
    pub serial: Option<String>,
    pub path: Option<String>,
}

impl DeviceSelector {
    /// Returns the model if the device is a supported Stream Deck accepted
    /// by this selector.
    pub fn matches(&self, vendor_id: u16, product_id: u16, serial: Option<&str>, path: &str) -> Option<Model> {
        if vendor_id != ELGATO_VENDOR_ID {
            return None;
        }
        let model = Model::from_product_id(product_id)?;
        if self.model.map_or(false, |wanted| wanted != model) {
            return None;
        }
        if let Some(wanted) = &self.serial {
            if serial != Some(wanted.as_str()) {
                return None;
            }
        }
        if let Some(wanted) = &self.path {
            if wanted != path {
                return None;
            }
        }
        Some(model)
    }
}

/// Lays out `command` followed by `args` in a zero-padded report.
pub fn build_report(protocol: Protocol, command: &[u8], args: &[u8]) -> Result<Vec<u8>, DeviceError> {
    let len = protocol.report_len();
    let used = command.len() + args.len();
    if used > len {
        return Err(DeviceError::ReportTooLarge { size: used, max: len });
    }
    let mut report = vec![0u8; len];
    report[..command.len()].copy_from_slice(command);
    report[command.len()..used].copy_from_slice(args);
    Ok(report)
}

/// Extracts the version string from a firmware feature report.
pub fn parse_firmware_version(protocol: Protocol, report: &[u8]) -> String {
    let offset = protocol.firmware_version_offset();
    if report.len() <= offset {
        return String::new();
    }
    let raw = &report[offset..];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}
