//! Lifecycle demo application
//!
//! Flies a small fleet through a few fixed-step frames and logs what each
//! entity and component does. Pass a `.toml` or `.ron` configuration file as
//! the first argument to override the defaults.

use std::any::Any;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};
use scene_lifecycle::foundation::logging;
use scene_lifecycle::prelude::*;

const FRAME: Duration = Duration::from_millis(16);
const FRAMES: u64 = 6;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scheduling error: {0}")]
    Scheduling(#[from] SchedulerError),
}

/// Text surface collecting one line per draw call
#[derive(Default)]
struct ConsoleSurface {
    lines: Vec<String>,
}

impl ConsoleSurface {
    fn write(&mut self, line: String) {
        self.lines.push(line);
    }

    fn present(&mut self, frame: u64) {
        for line in self.lines.drain(..) {
            info!("[frame {frame}] {line}");
        }
    }
}

impl Surface for ConsoleSurface {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn console(surface: &mut dyn Surface) -> Option<&mut ConsoleSurface> {
    surface.as_any_mut().downcast_mut::<ConsoleSurface>()
}

struct Ship {
    core: EntityCore,
    speed: Cell<f32>,
    distance: Cell<f32>,
}

impl Ship {
    fn new(name: &str, config: &LifecycleConfig, update_order: i32, draw_order: i32) -> Rc<Self> {
        Rc::new(Self {
            core: EntityCore::with_config(name, &config.components)
                .with_update_order(update_order)
                .with_draw_order(draw_order),
            speed: Cell::new(0.0),
            distance: Cell::new(0.0),
        })
    }
}

impl Entity for Ship {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn on_update(&self, time: &GameTime) {
        // thrusters have already burned this frame
        let thrust: f32 = self
            .core
            .get_components::<Thruster>()
            .iter()
            .filter(|thruster| thruster.firing.get())
            .map(|thruster| thruster.thrust)
            .sum();
        let dt = time.elapsed_secs();
        self.speed.set(self.speed.get() + thrust * dt);
        self.distance.set(self.distance.get() + self.speed.get() * dt);
        debug!("{} thrust={thrust:.1} speed={:.2}", self.name(), self.speed.get());
    }

    fn on_draw(&self, surface: &mut dyn Surface, _time: &GameTime) {
        if let Some(console) = console(surface) {
            console.write(format!(
                "{} distance={:.3} speed={:.2}",
                self.name(),
                self.distance.get(),
                self.speed.get()
            ));
        }
    }

    fn on_graphics_created(&self, device: &dyn GraphicsDevice) {
        info!("{} uploading its mesh to {}", self.name(), device.name());
    }
}

/// Burns one unit of fuel per update and detaches itself once dry
struct Thruster {
    core: ComponentCore,
    schedule: ScheduleState,
    fuel: Cell<u32>,
    firing: Cell<bool>,
    thrust: f32,
    me: Weak<Thruster>,
}

impl Thruster {
    fn new(fuel: u32, thrust: f32) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            core: ComponentCore::new(),
            schedule: ScheduleState::new(),
            fuel: Cell::new(fuel),
            firing: Cell::new(false),
            thrust,
            me: Weak::clone(me),
        })
    }
}

impl Component for Thruster {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
        Some(self)
    }
}

impl Schedulable for Thruster {
    fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    fn update(&self, _time: &GameTime) {
        let fuel = self.fuel.get();
        if fuel > 0 {
            self.fuel.set(fuel - 1);
            self.firing.set(true);
            return;
        }

        self.firing.set(false);
        let Some(entity) = self.entity() else {
            return;
        };
        if let Some(me) = self.me.upgrade() {
            info!("{}: thruster out of fuel, detaching", entity.name());
            entity.remove_component(me);
        }
    }
}

/// Draws a status line for its entity
struct Hud {
    core: ComponentCore,
    render: RenderState,
}

impl Hud {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            core: ComponentCore::new(),
            render: RenderState::new(),
        })
    }
}

impl Component for Hud {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
        Some(self)
    }
}

impl Renderable for Hud {
    fn render_state(&self) -> &RenderState {
        &self.render
    }

    fn draw(&self, surface: &mut dyn Surface, _time: &GameTime) {
        let Some(entity) = self.entity() else {
            return;
        };
        let thrusters = entity.core().get_components::<Thruster>().len();
        if let Some(console) = console(surface) {
            console.write(format!("{} hud: {thrusters} thruster(s) attached", entity.name()));
        }
    }

    fn graphics_reset(&self, device: &dyn GraphicsDevice) {
        debug!("hud rebuilding fonts for {}", device.name());
    }
}

fn load_config() -> Result<LifecycleConfig, ConfigError> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(LifecycleConfig::default());
    };
    let config = LifecycleConfig::load_from_file(&path)?;
    config.validate()?;
    Ok(config)
}

fn run(config: &LifecycleConfig) -> Result<(), DemoError> {
    let world = World::from_config(config);
    let device = HeadlessDevice::new("console");

    let scout = Ship::new("scout", config, 0, 1);
    let hauler = Ship::new("hauler", config, 1, 0);
    let hud = Hud::new();
    scout.add_component(Thruster::new(2, 4.0));
    scout.add_component(Thruster::new(4, 1.5));
    scout.components().try_add(hud.clone())?;
    hauler.add_component(Thruster::new(3, 2.0));

    world.add_all(&[scout.clone() as Rc<dyn Entity>, hauler.clone() as Rc<dyn Entity>]);
    world.add(BasicEntity::new("debris"));

    let mut surface = ConsoleSurface::default();
    for frame in 1..=FRAMES {
        if frame == 4 {
            info!("hauler goes dark");
            hauler.set_visible(false);
        }

        let time = world.step(FRAME);
        if frame == 1 {
            world.graphics_created(&device);
        }
        world.draw(&mut surface, &time);
        surface.present(time.frame());
    }

    if let Err(err) = hauler.components().try_add(hud) {
        warn!("hud stays with the scout: {err}");
    }
    world.graphics_reset(&device);

    let stats = world.stats();
    info!(
        "{} frames, {} entities; last frame {} updated, {} skipped, {} drawn, {} hidden",
        stats.frames, stats.entity_count, stats.updated, stats.skipped, stats.drawn, stats.hidden
    );
    for ship in world.entities().find_all::<Ship>() {
        info!(
            "{} travelled {:.3} with {} component(s) left",
            ship.name(),
            ship.distance.get(),
            ship.core().component_count()
        );
    }
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            logging::init();
            error!("lifecycle demo failed: {}", DemoError::from(err));
            std::process::exit(1);
        }
    };
    match config.log_filter.as_deref() {
        Some(filter) => logging::init_with_filter(filter),
        None => logging::init(),
    }

    info!("Starting lifecycle demo for world '{}'", config.world_name);
    if let Err(err) = run(&config) {
        error!("lifecycle demo failed: {err}");
        std::process::exit(1);
    }
    info!("Lifecycle demo finished");
}
