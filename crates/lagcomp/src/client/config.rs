use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub tick_rate: u32,
    /// One-way delay applied in both directions of this client's connection.
    pub lag: Duration,
    pub prediction: bool,
    /// Only honoured while `prediction` is on.
    pub reconciliation: bool,
    pub interpolation: bool,
}

impl ClientConfig {
    /// Applies the rule that reconciliation requires prediction.
    pub fn normalized(mut self) -> Self {
        self.reconciliation &= self.prediction;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_rate: 50,
            lag: Duration::from_millis(250),
            prediction: false,
            reconciliation: false,
            interpolation: true,
        }
    }
}
