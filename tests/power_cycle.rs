//! Whole-session behaviour across simulated power cycles.

use embassy_futures::block_on;
use offtime_driver::mock::{MockDelay, MockFlash, MockLed};
use offtime_driver::{BootContext, Config, Dispatch, Flashlight, OffTime, RampPolicy};

type Flash = MockFlash<256, 4, 128>;

static SCENARIO_TABLE: [u8; 6] = [4, 10, 50, 255, 50, 10];

static SCENARIO: Config = Config {
    ramp_table: &SCENARIO_TABLE,
    ramp_policy: RampPolicy::Triangle,
    step_delay_ms: 60,
    ..Config::RAMPING
};

/// Flash and SRAM as they survive between sessions.
struct Device {
    config: &'static Config,
    flash: Option<Flash>,
    ctx: BootContext,
}

impl Device {
    fn new(config: &'static Config) -> Self {
        Self {
            config,
            flash: Some(Flash::new(0x00)),
            ctx: BootContext::cold(),
        }
    }

    fn power_on(&mut self) -> Flashlight<'static, MockLed, Flash, BootContext> {
        let flash = self.flash.take().expect("device already powered");
        Flashlight::new(self.config, MockLed::new(), flash, 0, 128, self.ctx).unwrap()
    }

    fn power_off(&mut self, light: Flashlight<'static, MockLed, Flash, BootContext>, gap: OffTime) {
        let (_, flash, ctx) = light.into_parts();
        self.flash = Some(flash);
        self.ctx = ctx.after_power_off(gap);
    }

    /// Boots, records the dispatch and cuts power again.
    fn cycle(&mut self, gap: OffTime) -> (u8, Dispatch) {
        let mut light = self.power_on();
        let boot = light.boot();
        self.power_off(light, gap);
        (boot.mode, boot.dispatch)
    }
}

#[test]
fn ramp_capture_scenario() {
    let mut device = Device::new(&SCENARIO);

    assert_eq!(device.cycle(OffTime::Short), (0, Dispatch::Hold(0xFF)));
    assert_eq!(device.cycle(OffTime::Short), (1, Dispatch::Hold(0x40)));
    assert_eq!(device.cycle(OffTime::Short), (2, Dispatch::Hold(0x10)));
    assert_eq!(device.cycle(OffTime::Short), (3, Dispatch::Hold(0x04)));

    let mut light = device.power_on();
    let boot = light.boot();
    assert_eq!((boot.mode, boot.dispatch), (4, Dispatch::Ramp));

    let mut delay = MockDelay::new();
    block_on(light.ramp_for(&mut delay, 3));
    assert_eq!(light.led().history(), &[0, 4, 10, 50]);
    assert_eq!(light.memory().last_level, 50);
    assert_eq!(delay.elapsed_ms, 180);
    device.power_off(light, OffTime::Short);

    let mut light = device.power_on();
    let boot = light.boot();
    assert_eq!(boot.off_time, OffTime::Short);
    assert_eq!((boot.mode, boot.dispatch), (5, Dispatch::Hold(50)));
    assert_eq!(light.led().level(), 50);
    device.power_off(light, OffTime::Long);

    assert_eq!(device.cycle(OffTime::Long), (0, Dispatch::Hold(0xFF)));
}

#[test]
fn ramp_runs_full_triangle_before_capture() {
    let mut device = Device::new(&SCENARIO);
    for _ in 0..4 {
        device.cycle(OffTime::Short);
    }

    let mut light = device.power_on();
    assert_eq!(light.boot().dispatch, Dispatch::Ramp);

    let mut delay = MockDelay::new();
    block_on(light.ramp_for(&mut delay, 10));
    assert_eq!(
        &light.led().history()[1..],
        &[4, 10, 50, 255, 50, 10, 50, 255, 50, 10]
    );

    block_on(light.ramp_for(&mut delay, 1));
    assert_eq!(light.led().level(), 4);
    assert_eq!(light.memory().last_level, 4);
}

#[test]
fn tapping_wraps_around_the_mode_cycle() {
    for config in [&Config::BASIC, &Config::RAMPING] {
        let mut device = Device::new(config);
        let count = config.mode_count();

        let (first, _) = device.cycle(OffTime::Short);
        for _ in 0..count - 1 {
            device.cycle(OffTime::Short);
        }
        let (again, _) = device.cycle(OffTime::Short);
        assert_eq!(first, again);
    }
}

#[test]
fn long_off_resets_without_memory() {
    let mut device = Device::new(&Config::BASIC);
    device.cycle(OffTime::Short);
    device.cycle(OffTime::Short);
    assert_eq!(device.cycle(OffTime::Long), (2, Dispatch::Hold(0x10)));
    assert_eq!(device.cycle(OffTime::Long), (0, Dispatch::Hold(0xFF)));
}

static MEMORY: Config = Config {
    mode_memory: true,
    ..Config::BASIC
};

#[test]
fn long_off_resumes_with_memory() {
    let mut device = Device::new(&MEMORY);
    device.cycle(OffTime::Short);
    device.cycle(OffTime::Short);
    assert_eq!(device.cycle(OffTime::Long), (2, Dispatch::Hold(0x10)));
    assert_eq!(device.cycle(OffTime::Long), (2, Dispatch::Hold(0x10)));
    assert_eq!(device.cycle(OffTime::Short), (2, Dispatch::Hold(0x10)));
    assert_eq!(device.cycle(OffTime::Long), (3, Dispatch::Hold(0x04)));
}

#[test]
fn decay_flag_is_cleared_every_boot() {
    let mut device = Device::new(&Config::RAMPING);
    for gap in [OffTime::Long, OffTime::Short, OffTime::Long, OffTime::Short] {
        let mut light = device.power_on();
        light.boot();
        assert_eq!(light.memory().decay_flag, 0);
        device.power_off(light, gap);
    }
}

#[test]
fn store_wear_stays_bounded() {
    let mut device = Device::new(&Config::RAMPING);
    for _ in 0..100 {
        device.cycle(OffTime::Short);
    }
    let flash = device.flash.take().unwrap();
    // 100 boots over 32 slots per page
    assert_eq!(flash.writes, 100);
    assert_eq!(flash.erases, 3);
}
