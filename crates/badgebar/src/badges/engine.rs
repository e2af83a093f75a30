use std::time::Instant;

use super::{BadgePool, Palette};

/// Number of provider groups that can be registered at the same time.
pub const GROUP_CAPACITY: usize = 8;

/// A unit of domain logic owning zero or more badges of the pool.
///
/// A group is set up by the closure given to [`Engine::register`], which receives the pool so it
/// can allocate its initial badges. Groups only ever touch badges whose handles they keep in
/// their own state.
pub trait BadgeGroup {
    /// Called once per tick, in registration order, with the seconds elapsed since the last tick.
    fn update(&mut self, pool: &mut BadgePool, dt: f64);

    /// Called once when the engine shuts down. Must release the badges the group still owns.
    fn cleanup(&mut self, pool: &mut BadgePool);
}

struct RegisteredGroup {
    name: String,
    group: Box<dyn BadgeGroup>,
}

/// Owns the badge pool and the table of registered groups, and advances both once per tick.
pub struct Engine {
    pool: BadgePool,
    groups: Vec<Option<RegisteredGroup>>,
    last_tick: Option<Instant>,
    animated: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pool", &self.pool)
            .field("groups", &self.group_names().collect::<Vec<_>>())
            .field("animated", &self.animated)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(BadgePool::default())
    }
}

impl Engine {
    pub fn new(pool: BadgePool) -> Self {
        Self::with_group_capacity(pool, GROUP_CAPACITY)
    }

    pub fn with_group_capacity(pool: BadgePool, group_capacity: usize) -> Self {
        Engine { pool, groups: (0..group_capacity).map(|_| None).collect(), last_tick: None, animated: false }
    }

    /// Register a group, running its setup against the pool.
    ///
    /// If the group table is full this logs a warning and returns `false` without running setup.
    pub fn register<F>(&mut self, name: impl Into<String>, setup: F) -> bool
    where
        F: FnOnce(&mut BadgePool) -> Box<dyn BadgeGroup>,
    {
        let name = name.into();
        let Some(slot) = self.groups.iter_mut().find(|slot| slot.is_none()) else {
            log::warn!("Group table is full, not registering group {}", name);
            return false;
        };
        log::debug!("Setting up group {}", name);
        let group = setup(&mut self.pool);
        *slot = Some(RegisteredGroup { name, group });
        true
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(|registered| registered.name.as_str())
    }

    /// Advance everything by the time elapsed since the previous tick, measured on the monotonic
    /// clock. The first tick advances by zero, so time spent setting up groups is not animated.
    /// Returns whether any badge moved, see [`Engine::should_fast_redraw`].
    pub fn tick(&mut self) -> bool {
        let now = Instant::now();
        let dt = self.last_tick.map_or(0.0, |last| now.duration_since(last).as_secs_f64());
        self.last_tick = Some(now);
        self.advance(dt)
    }

    /// Advance everything by `dt` seconds: every group's update in registration order, then the
    /// animation of every badge.
    pub fn advance(&mut self, dt: f64) -> bool {
        for registered in self.groups.iter_mut().flatten() {
            registered.group.update(&mut self.pool, dt);
        }
        self.animated = self.pool.advance_all(dt);
        self.animated
    }

    /// Clean up every group in registration order and release whatever is left in the pool.
    pub fn shutdown(&mut self) {
        for mut registered in self.groups.iter_mut().filter_map(Option::take) {
            log::debug!("Cleaning up group {}", registered.name);
            registered.group.cleanup(&mut self.pool);
        }
        self.pool.release_all();
    }

    pub fn pool(&self) -> &BadgePool {
        &self.pool
    }

    pub fn badge_count(&self) -> usize {
        self.pool.capacity()
    }

    pub fn badge_colors(&self, index: usize) -> Option<Palette> {
        self.pool.colors_at(index)
    }

    pub fn badge_text(&self, index: usize) -> Option<&str> {
        self.pool.text_at(index)
    }

    pub fn badge_x_offset(&self, index: usize) -> f64 {
        self.pool.x_offset_at(index)
    }

    /// Whether any badge animation moved during the last tick.
    pub fn should_fast_redraw(&self) -> bool {
        self.animated
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::badges::{BadgeHandle, Quality};
    use pretty_assertions::assert_eq;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// Owns a single badge that is visible while `show` is set.
    struct Recorder {
        name: &'static str,
        badge: Option<BadgeHandle>,
        journal: Journal,
        show: Rc<RefCell<bool>>,
    }

    impl BadgeGroup for Recorder {
        fn update(&mut self, pool: &mut BadgePool, dt: f64) {
            self.journal.borrow_mut().push(format!("update {} {}", self.name, dt));
            if let Some(badge) = self.badge {
                pool.set_visible(badge, *self.show.borrow());
            }
        }

        fn cleanup(&mut self, pool: &mut BadgePool) {
            self.journal.borrow_mut().push(format!("cleanup {}", self.name));
            if let Some(badge) = self.badge.take() {
                pool.release(badge);
            }
        }
    }

    fn register_recorder(engine: &mut Engine, name: &'static str, journal: &Journal, show: &Rc<RefCell<bool>>) -> bool {
        let journal = journal.clone();
        let show = show.clone();
        engine.register(name, move |pool| {
            journal.borrow_mut().push(format!("setup {}", name));
            let badge = pool.allocate();
            if let Some(badge) = badge {
                pool.set_text(badge, name);
                pool.set_quality(badge, Quality::Gold);
            }
            Box::new(Recorder { name, badge, journal, show })
        })
    }

    #[test]
    fn test_groups_run_in_registration_order() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        let mut engine = Engine::new(BadgePool::with_capacity(4));
        register_recorder(&mut engine, "a", &journal, &show);
        register_recorder(&mut engine, "b", &journal, &show);
        engine.advance(0.5);
        engine.advance(0.25);
        engine.shutdown();
        assert_eq!(
            vec!["setup a", "setup b", "update a 0.5", "update b 0.5", "update a 0.25", "update b 0.25", "cleanup a", "cleanup b"],
            *journal.borrow()
        );
        assert_eq!(0, engine.pool().live_count());
    }

    #[test]
    fn test_full_group_table_skips_setup() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        let mut engine = Engine::with_group_capacity(BadgePool::with_capacity(4), 1);
        assert!(register_recorder(&mut engine, "a", &journal, &show));
        assert!(!register_recorder(&mut engine, "b", &journal, &show));
        assert_eq!(vec!["setup a"], *journal.borrow());
        assert_eq!(vec!["a"], engine.group_names().collect::<Vec<_>>());
    }

    #[test]
    fn test_group_without_badge_survives_full_pool() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        let mut engine = Engine::new(BadgePool::with_capacity(1));
        register_recorder(&mut engine, "a", &journal, &show);
        register_recorder(&mut engine, "b", &journal, &show);
        engine.advance(0.1);
        assert_eq!(Some("a"), engine.badge_text(0));
        assert_eq!(1, engine.pool().live_count());
    }

    #[test]
    fn test_fast_redraw_follows_animation() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        let mut engine = Engine::new(BadgePool::with_capacity(2));
        register_recorder(&mut engine, "a", &journal, &show);

        assert!(!engine.should_fast_redraw());
        assert!(engine.advance(1.0));
        assert!(engine.should_fast_redraw());
        assert!(engine.advance(1.0));
        assert_eq!(0.0, engine.badge_x_offset(0));
        assert!(!engine.advance(1.0));
        assert!(!engine.should_fast_redraw());

        *show.borrow_mut() = false;
        assert!(engine.advance(0.5));
        assert_eq!(0.5, engine.badge_x_offset(0));
        assert!(engine.advance(0.5));
        assert!(!engine.advance(0.5));
        assert_eq!(1.0, engine.badge_x_offset(0));
    }

    #[test]
    fn test_first_tick_ignores_setup_time() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        let mut engine = Engine::new(BadgePool::with_capacity(2));
        register_recorder(&mut engine, "a", &journal, &show);
        std::thread::sleep(std::time::Duration::from_millis(50));

        engine.tick();
        assert_eq!(Some(&"update a 0".to_string()), journal.borrow().last());
        assert_eq!(1.0, engine.badge_x_offset(0));

        std::thread::sleep(std::time::Duration::from_millis(20));
        engine.tick();
        assert!(engine.badge_x_offset(0) < 1.0);
    }

    #[test]
    fn test_renderer_queries() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        let mut engine = Engine::new(BadgePool::with_capacity(3));
        register_recorder(&mut engine, "a", &journal, &show);
        assert_eq!(3, engine.badge_count());
        assert_eq!(Some(Quality::Gold.palette()), engine.badge_colors(0));
        assert_eq!(None, engine.badge_colors(1));
        assert_eq!(None, engine.badge_text(7));
    }

    #[test]
    fn test_drop_runs_cleanup() {
        let journal = Journal::default();
        let show = Rc::new(RefCell::new(true));
        {
            let mut engine = Engine::default();
            register_recorder(&mut engine, "a", &journal, &show);
        }
        assert_eq!(vec!["setup a", "cleanup a"], *journal.borrow());
    }
}
