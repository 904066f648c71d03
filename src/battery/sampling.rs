use crate::bsp::BatteryAdc;

/// Conversion of an averaged ADC reading into battery volts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdcScale {
    /// Raw counts against a reference voltage, e.g. 4095 counts at 3.3 V
    Counts {
        full_scale: u16,
        reference_volts: f32,
        divider: f32,
    },
    /// The ADC already reports calibrated millivolts at the pin
    Millivolts { divider: f32 },
}

impl AdcScale {
    pub fn to_volts(&self, average: f32) -> f32 {
        match *self {
            AdcScale::Counts {
                full_scale,
                reference_volts,
                divider,
            } => average * (reference_volts / f32::from(full_scale)) * divider,
            AdcScale::Millivolts { divider } => average / 1000.0 * divider,
        }
    }
}

/// Averages a fixed burst of back to back ADC readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstSampler {
    burst: u16,
    discard_first: bool,
    scale: AdcScale,
}

impl BurstSampler {
    pub const fn new(burst: u16, discard_first: bool, scale: AdcScale) -> Self {
        BurstSampler {
            burst,
            discard_first,
            scale,
        }
    }

    /// Mean of one burst, in battery volts
    ///
    /// With `discard_first` set the measurement path is switched on around the
    /// burst and the first reading after switching is thrown away while the
    /// analog switch settles.
    pub fn sample<A: BatteryAdc>(&self, adc: &mut A) -> f32 {
        if self.burst == 0 {
            return 0.0;
        }

        if self.discard_first {
            adc.enable_measurement();
            let _ = adc.read_raw();
        }

        let mut sum: u32 = 0;
        for _ in 0..self.burst {
            sum += u32::from(adc.read_raw());
        }

        if self.discard_first {
            adc.disable_measurement();
        }

        let average = sum as f32 / f32::from(self.burst);
        self.scale.to_volts(average)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct ScriptedAdc {
        readings: Vec<u16>,
        reads: usize,
        enabled: bool,
        enables: usize,
    }

    impl ScriptedAdc {
        fn new(readings: Vec<u16>) -> Self {
            ScriptedAdc {
                readings,
                reads: 0,
                enabled: false,
                enables: 0,
            }
        }
    }

    impl BatteryAdc for ScriptedAdc {
        fn read_raw(&mut self) -> u16 {
            let value = self.readings[self.reads % self.readings.len()];
            self.reads += 1;
            value
        }

        fn enable_measurement(&mut self) {
            self.enabled = true;
            self.enables += 1;
        }

        fn disable_measurement(&mut self) {
            self.enabled = false;
        }
    }

    const TWELVE_BIT: AdcScale = AdcScale::Counts {
        full_scale: 4095,
        reference_volts: 3.3,
        divider: 2.0,
    };

    #[test]
    fn counts_scale_through_divider() {
        let volts = TWELVE_BIT.to_volts(2482.0);
        assert!((volts - 4.0).abs() < 0.001, "{}", volts);
    }

    #[test]
    fn millivolts_scale_through_divider() {
        let volts = AdcScale::Millivolts { divider: 2.0 }.to_volts(1850.0);
        assert!((volts - 3.7).abs() < 1e-5, "{}", volts);
    }

    #[test]
    fn averages_whole_burst() {
        let sampler = BurstSampler::new(4, false, AdcScale::Millivolts { divider: 2.0 });
        let mut adc = ScriptedAdc::new(vec![1800, 1900, 2000, 2100]);

        let volts = sampler.sample(&mut adc);

        assert_eq!(adc.reads, 4);
        assert_eq!(adc.enables, 0);
        assert!((volts - 3.9).abs() < 1e-5, "{}", volts);
    }

    #[test]
    fn discards_settling_reading() {
        let sampler = BurstSampler::new(2, true, AdcScale::Millivolts { divider: 2.0 });
        let mut adc = ScriptedAdc::new(vec![0, 2000, 2000]);

        let volts = sampler.sample(&mut adc);

        assert_eq!(adc.reads, 3);
        assert_eq!(adc.enables, 1);
        assert!(!adc.enabled);
        assert!((volts - 4.0).abs() < 1e-5, "{}", volts);
    }

    #[test]
    fn takes_fresh_burst_each_call() {
        let sampler = BurstSampler::new(16, false, TWELVE_BIT);
        let mut adc = ScriptedAdc::new(vec![2482]);

        sampler.sample(&mut adc);
        sampler.sample(&mut adc);

        assert_eq!(adc.reads, 32);
    }
}
