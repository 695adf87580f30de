use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    /// Accepted although the score went up.
    UphillAccepted,
    Rejected,
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Decision::Rejected)
    }
}

/// The Metropolis acceptance rule against the last accepted score.
#[derive(Debug, Clone)]
pub struct MetropolisCriterion {
    temperature: f64,
    last_score: f64,
    lowest_score: f64,
    accepted: usize,
    uphill_accepted: usize,
    rejected: usize,
}

impl MetropolisCriterion {
    pub fn new(temperature: f64, initial_score: f64) -> Self {
        Self {
            temperature,
            last_score: initial_score,
            lowest_score: initial_score,
            accepted: 0,
            uphill_accepted: 0,
            rejected: 0,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, kt: f64) {
        self.temperature = kt;
    }

    pub fn last_score(&self) -> f64 {
        self.last_score
    }

    pub fn lowest_score(&self) -> f64 {
        self.lowest_score
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn uphill_accepted(&self) -> usize {
        self.uphill_accepted
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Decides on a trial scoring `score`.
    ///
    /// Downhill and level moves are always accepted without consuming a
    /// random number. Uphill moves are accepted with probability
    /// `exp(-(score - last) / kT)`; at `kT <= 0` they are always rejected.
    pub fn decide<R: Rng + ?Sized>(&mut self, score: f64, rng: &mut R) -> Decision {
        let delta = score - self.last_score;
        let decision = if delta <= 0.0 {
            Decision::Accepted
        } else if self.temperature > 0.0 && rng.r#gen::<f64>() < (-delta / self.temperature).exp() {
            Decision::UphillAccepted
        } else {
            Decision::Rejected
        };

        match decision {
            Decision::Accepted => self.accepted += 1,
            Decision::UphillAccepted => {
                self.accepted += 1;
                self.uphill_accepted += 1;
            }
            Decision::Rejected => self.rejected += 1,
        }
        if decision.is_accepted() {
            self.last_score = score;
            self.lowest_score = self.lowest_score.min(score);
        }
        decision
    }
}
