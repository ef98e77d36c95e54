use crate::coords::device_scale;
use crate::shaders::DEFAULT_FRAGMENT_SOURCE;

/// Where the hero mounts and how it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct HeroConfig {
    /// Element that hosts the canvas.
    pub section_selector: String,
    /// A canvas matching this inside the section is reused instead of creating one.
    pub canvas_selector: String,
    /// Class list given to a freshly created canvas.
    pub canvas_class: String,
    pub canvas_background: String,
    /// Fraction of the native pixel density to render at.
    pub pixel_density: f64,
    pub min_scale: f64,
    pub fragment_source: String,
    /// Pre-flight the fragment source with a throwaway compile before the first frame.
    pub validate_on_start: bool,
    pub log_level: log::Level,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            section_selector: "#home".to_owned(),
            canvas_selector: "canvas.webgl-canvas".to_owned(),
            canvas_class: "webgl-canvas absolute inset-0 w-full h-full object-contain touch-none"
                .to_owned(),
            canvas_background: "black".to_owned(),
            pixel_density: 0.5,
            min_scale: 1.0,
            fragment_source: DEFAULT_FRAGMENT_SOURCE.to_owned(),
            validate_on_start: true,
            log_level: log::Level::Info,
        }
    }
}

impl HeroConfig {
    pub fn with_section_selector(mut self, selector: impl Into<String>) -> Self {
        self.section_selector = selector.into();
        self
    }

    pub fn with_fragment_source(mut self, source: impl Into<String>) -> Self {
        self.fragment_source = source.into();
        self
    }

    pub fn with_pixel_density(mut self, density: f64, min_scale: f64) -> Self {
        self.pixel_density = density;
        self.min_scale = min_scale;
        self
    }

    pub fn with_validate_on_start(mut self, validate: bool) -> Self {
        self.validate_on_start = validate;
        self
    }

    pub fn with_log_level(mut self, level: log::Level) -> Self {
        self.log_level = level;
        self
    }

    /// Rendering scale for `device_pixel_ratio` under this configuration.
    pub fn scale_for(&self, device_pixel_ratio: f64) -> f64 {
        device_scale(device_pixel_ratio, self.pixel_density, self.min_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_home_section() {
        let config = HeroConfig::default();
        assert_eq!(config.section_selector, "#home");
        assert_eq!(config.fragment_source, DEFAULT_FRAGMENT_SOURCE);
        assert_eq!(config.scale_for(2.0), 1.0);
        assert_eq!(config.scale_for(3.0), 1.5);
    }

    #[test]
    fn builders_override_density() {
        let config = HeroConfig::default().with_pixel_density(1.0, 0.5);
        assert_eq!(config.scale_for(0.75), 0.75);
        assert_eq!(config.scale_for(0.25), 0.5);
    }

    #[test]
    fn builders_toggle_preflight_and_logging() {
        let config = HeroConfig::default()
            .with_validate_on_start(false)
            .with_log_level(log::Level::Debug);
        assert!(!config.validate_on_start);
        assert_eq!(config.log_level, log::Level::Debug);
    }
}
