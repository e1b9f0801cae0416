//! Pipeline configuration

/// Tunables shared by every step of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ChefConfig {
    /// Model override; `None` uses the provider's default
    pub model: Option<String>,
    /// Upper bound on plan/critique rounds
    pub max_iterations: usize,
    pub temperature: f32,
    pub top_p: f32,
    /// Transcript lines included in plain chat prompts
    pub history_window: usize,
    /// Tool execution rounds allowed in the pantry step
    pub max_tool_rounds: usize,
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_iterations: 3,
            temperature: 0.7,
            top_p: 0.95,
            history_window: 6,
            max_tool_rounds: 4,
        }
    }
}

impl ChefConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChefConfig::default();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.history_window, 6);
        assert_eq!(config.max_tool_rounds, 4);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_iterations_never_zero() {
        assert_eq!(ChefConfig::default().with_max_iterations(0).max_iterations, 1);
    }
}
