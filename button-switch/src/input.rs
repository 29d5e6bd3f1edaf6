use embedded_hal::digital::InputPin;

/// Wiring of a push button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Wiring {
    /// The pin is pulled up, so an open contact reads high
    pub pulled_up: bool,
    /// The contact closes when the button is pressed
    pub normally_open: bool,
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            pulled_up: true,
            normally_open: true,
        }
    }
}

/// Reads the raw pressed state of a button from an input pin.
pub struct ButtonInput<P: InputPin> {
    pin: P,
    wiring: Wiring,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new(pin: P, wiring: Wiring) -> Self {
        Self { pin, wiring }
    }

    /// Normally open button to ground, with pull-up. Pressed reads low
    pub fn active_low(pin: P) -> Self {
        Self::new(pin, Wiring::default())
    }

    /// Normally open button to VCC, with pull-down. Pressed reads high
    pub fn active_high(pin: P) -> Self {
        Self::new(
            pin,
            Wiring {
                pulled_up: false,
                normally_open: true,
            },
        )
    }

    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// One pin read
    pub fn is_pressed(&mut self) -> Result<bool, P::Error> {
        let high = self.pin.is_high()?;
        // A closed contact pulls the pin away from its bias
        let closed = high != self.wiring.pulled_up;
        Ok(closed == self.wiring.normally_open)
    }

    pub fn release(self) -> P {
        self.pin
    }
}
