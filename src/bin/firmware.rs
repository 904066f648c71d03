//! Bottom timer on a Raspberry Pi Pico
//!
//! MS5837-30BA on I2C0 (GP4 SDA, GP5 SCL), SSD1306 128x64 OLED on I2C1
//! (GP2 SDA, GP3 SCL), battery through the on-board VSYS/3 divider on GP29.
#![no_std]
#![no_main]

use cortex_m::peripheral::SCB;
use defmt::info;
use defmt_rtt as _;
use embedded_hal::{adc::OneShot, blocking::delay::DelayMs};
use fugit::{MicrosDurationU32, RateExtU32};
use panic_probe as _;
use rp_pico::{
    hal::{
        self,
        adc::{Adc, AdcPin},
        clocks::init_clocks_and_plls,
        entry,
        gpio::{FunctionI2C, Pin, PullUp},
        pac,
        timer::{Alarm, Alarm0, Timer},
        watchdog::Watchdog,
        Sio, I2C,
    },
    Pins, XOSC_CRYSTAL_FREQ,
};
use ssd1306::{prelude::*, I2CDisplayInterface, Ssd1306};

use bottom_timer::{
    battery::AdcScale,
    bsp::{BatteryAdc, Clock, Sleeper},
    config::FLUID_DENSITY,
    ms5837::{Model, Ms5837},
    render::GraphicsScreen,
    Duration, Instant, LoopState, Peripherals, Profile, Step,
};

/// Pico VSYS sense divider into the 12-bit ADC
const PICO_PROFILE: Profile = Profile {
    adc_scale: AdcScale::Counts {
        full_scale: 4095,
        reference_volts: 3.3,
        divider: 3.0,
    },
    ..Profile::basic()
};

struct TimerClock(Timer);

impl Clock for TimerClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.0.get_counter().ticks() / 1_000)
    }
}

/// Both depths halt the core in WFE until the alarm interrupt goes pending,
/// deep sleep also sets SLEEPDEEP so the clocks in SLEEP_EN get gated
struct TimerSleeper {
    timer: Timer,
    alarm: Alarm0,
    scb: SCB,
}

impl TimerSleeper {
    fn wait_for_alarm(&mut self, duration: Duration) {
        let millis = duration.to_millis() as u32;
        if self.alarm.schedule(MicrosDurationU32::millis(millis)).is_err() {
            self.timer.delay_ms(millis);
            return;
        }

        self.alarm.enable_interrupt();
        while !self.alarm.finished() {
            cortex_m::asm::wfe();
        }
        self.alarm.clear_interrupt();
        self.alarm.disable_interrupt();
    }
}

impl Sleeper for TimerSleeper {
    fn sleep_light(&mut self, duration: Duration) {
        self.wait_for_alarm(duration);
    }

    fn sleep_deep(&mut self, duration: Option<Duration>) {
        self.scb.set_sleepdeep();

        let Some(duration) = duration else {
            info!("Halting until reset");
            loop {
                cortex_m::asm::wfi();
            }
        };

        self.wait_for_alarm(duration);
        self.scb.clear_sleepdeep();
    }
}

struct VsysAdc<P> {
    adc: Adc,
    pin: P,
}

impl<P> BatteryAdc for VsysAdc<P>
where
    Adc: OneShot<Adc, u16, P>,
{
    fn read_raw(&mut self) -> u16 {
        self.adc.read(&mut self.pin).unwrap_or(0)
    }
}

#[entry]
fn main() -> ! {
    info!("Program start");
    // Soft-reset does not release the hardware spinlocks
    unsafe {
        hal::sio::spinlock_reset();
    }

    let mut pac = pac::Peripherals::take().unwrap();
    let mut core = pac::CorePeripherals::take().unwrap();

    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);
    let pins = Pins::new(pac.IO_BANK0, pac.PADS_BANK0, sio.gpio_bank0, &mut pac.RESETS);

    let clocks = init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let alarm = timer.alarm_0().unwrap();

    // Disabled but pending interrupts wake WFE
    core.SCB.set_sevonpend();

    let sensor_sda: Pin<_, FunctionI2C, PullUp> = pins.gpio4.reconfigure();
    let sensor_scl: Pin<_, FunctionI2C, PullUp> = pins.gpio5.reconfigure();
    let sensor_i2c = I2C::i2c0(
        pac.I2C0,
        sensor_sda,
        sensor_scl,
        100.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );

    let display_sda: Pin<_, FunctionI2C, PullUp> = pins.gpio2.reconfigure();
    let display_scl: Pin<_, FunctionI2C, PullUp> = pins.gpio3.reconfigure();
    let display_i2c = I2C::i2c1(
        pac.I2C1,
        display_sda,
        display_scl,
        400.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );

    let mut display = Ssd1306::new(
        I2CDisplayInterface::new(display_i2c),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    display.init().unwrap();
    let mut screen = GraphicsScreen::new(display);

    let mut sensor = Ms5837::new(sensor_i2c, timer, Model::Ms5837_30Ba, FLUID_DENSITY).unwrap();

    let mut adc = VsysAdc {
        adc: Adc::new(pac.ADC, &mut pac.RESETS),
        pin: AdcPin::new(pins.voltage_monitor.into_floating_input()),
    };

    let clock = TimerClock(timer);
    let mut sleeper = TimerSleeper {
        timer,
        alarm,
        scb: core.SCB,
    };

    let mut hw = Peripherals {
        sensor: &mut sensor,
        adc: &mut adc,
        screen: &mut screen,
        sleeper: &mut sleeper,
        clock: &clock,
    };

    let mut state = LoopState::new(&PICO_PROFILE).unwrap();

    state.start(&mut hw).unwrap();

    loop {
        if state.iterate(&mut hw).unwrap() == Step::Halted {
            info!("Halted");
        }
    }
}
