use tracing::info;

use crate::control_msg::Brightness;
use crate::error::DeviceError;
use crate::streamdeck::Model;

/// Something with a display whose brightness we can drive.
///
/// The fader thread owns exactly one panel and is the only caller,
/// so implementations don't need interior locking.
pub trait Panel: Send {
    fn set_brightness(&mut self, brightness: Brightness) -> Result<(), DeviceError>;

    /// Clears the key images and shows the logo.
    fn reset(&mut self) -> Result<(), DeviceError>;

    fn firmware_version(&mut self) -> Result<String, DeviceError>;

    /// Human readable name shown in status output.
    fn describe(&self) -> String;
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn set_brightness(&mut self, brightness: Brightness) -> Result<(), DeviceError> {
        (**self).set_brightness(brightness)
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        (**self).reset()
    }

    fn firmware_version(&mut self) -> Result<String, DeviceError> {
        (**self).firmware_version()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Stand-in for a real device. Logs the reports it would send.
pub struct DummyPanel {
    model: Model,
    level: Option<Brightness>,
}

impl DummyPanel {
    pub fn new(model: Model) -> DummyPanel {
        return DummyPanel { model, level: None };
    }

    #[cfg(test)]
    fn level(&self) -> Option<Brightness> {
        return self.level;
    }
}

impl Panel for DummyPanel {
    fn set_brightness(&mut self, brightness: Brightness) -> Result<(), DeviceError> {
        let report = self.model.protocol().brightness_report(brightness.percent())?;
        info!(model = %self.model, previous = ?self.level, %brightness, ?report, "would set brightness");
        self.level = Some(brightness);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        let report = self.model.protocol().reset_report()?;
        info!(model = %self.model, ?report, "would reset");
        Ok(())
    }

    fn firmware_version(&mut self) -> Result<String, DeviceError> {
        Ok("dummy".to_string())
    }

    fn describe(&self) -> String {
        format!("dummy {}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_remembers_level() {
        let mut panel = DummyPanel::new(Model::Mini);
        assert_eq!(panel.level(), None);
        panel.set_brightness(Brightness::new(30)).unwrap();
        assert_eq!(panel.level(), Some(Brightness::new(30)));
        assert_eq!(panel.describe(), "dummy mini");
    }

    #[test]
    fn boxed_panel_forwards() {
        let mut panel: Box<dyn Panel> = Box::new(DummyPanel::new(Model::Xl));
        panel.set_brightness(Brightness::new(5)).unwrap();
        assert_eq!(panel.firmware_version().unwrap(), "dummy");
        assert_eq!(panel.describe(), "dummy xl");
    }
}
