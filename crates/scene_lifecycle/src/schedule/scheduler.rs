//! Deferred-mutation scheduler shared by the entity and component collections
//!
//! A [`Scheduler`] never changes its live membership while anything might be
//! iterating it. `add` and `remove` only queue requests; [`Scheduler::flush`]
//! applies them, and [`Scheduler::update`] flushes before it traverses. A
//! member can therefore remove itself, or add new members, from inside its
//! own callback: the current traversal sees the old membership, the next
//! `update` sees the new one.
//!
//! Two ordered views are kept next to the insertion-ordered member list:
//! update order (schedulable members) and draw order (renderable members).
//! Each view is re-sorted only when its dirty flag is set, either by an
//! admission or by an order-change notification from a live member.

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use super::error::{precondition_failed, SchedulerError};
use super::member::{AsAnyRc, Capabilities, Member, Renderable, Schedulable};
use super::queue::PendingSet;
use super::view::OrderedView;
use crate::config::SchedulerConfig;
use crate::foundation::collections::{MemberKey, SubscriptionId};
use crate::foundation::time::GameTime;
use crate::render::{GraphicsDevice, Surface};

/// Callbacks a scheduler runs around membership changes
///
/// The component collection uses these to maintain the component's
/// back-reference to its entity.
pub trait MembershipHooks<M: ?Sized> {
    /// Checked when a member is queued and again when it is admitted
    fn admissible(&self, _member: &Rc<M>) -> Result<(), SchedulerError> {
        Ok(())
    }

    /// The member has just been admitted
    fn admitted(&self, _member: &Rc<M>) {}

    /// The member has just been retired
    fn retired(&self, _member: &Rc<M>) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl<M: ?Sized> MembershipHooks<M> for NoHooks {}

/// Outcome of one update or draw traversal
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    /// Members whose callback ran
    pub visited: usize,
    /// Members skipped because they were inactive or invisible
    pub skipped: usize,
}

/// Outcome of one flush
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushSummary {
    /// Members admitted
    pub admitted: usize,
    /// Members retired
    pub retired: usize,
    /// Requests that were no-ops (already a member, not a member, rejected)
    pub ignored: usize,
}

impl FlushSummary {
    fn is_noop(&self) -> bool {
        self.admitted == 0 && self.retired == 0
    }
}

struct UpdateLink {
    target: Rc<dyn Schedulable>,
    order: SubscriptionId,
    activity: SubscriptionId,
}

struct DrawLink {
    target: Rc<dyn Renderable>,
    order: SubscriptionId,
}

struct Admission<M: ?Sized> {
    member: Rc<M>,
    capabilities: Capabilities,
    update: Option<UpdateLink>,
    draw: Option<DrawLink>,
}

impl<M: ?Sized> Admission<M> {
    fn unsubscribe(&self) {
        if let Some(link) = &self.update {
            let schedule = link.target.schedule();
            schedule.update_order_changed().unsubscribe(link.order);
            schedule.active_changed().unsubscribe(link.activity);
        }
        if let Some(link) = &self.draw {
            link.target.render_state().draw_order_changed().unsubscribe(link.order);
        }
    }
}

struct LiveState<M: ?Sized> {
    members: Vec<Rc<M>>,
    admissions: HashMap<MemberKey, Admission<M>>,
    update_view: OrderedView<dyn Schedulable>,
    draw_view: OrderedView<dyn Renderable>,
}

struct PendingQueues<M: ?Sized> {
    adds: PendingSet<M>,
    removes: PendingSet<M>,
}

/// Collection of members with deferred mutation and ordered traversal
pub struct Scheduler<M: ?Sized + Member, H: MembershipHooks<M> = NoHooks> {
    label: String,
    log_flushes: bool,
    hooks: H,
    live: RefCell<LiveState<M>>,
    pending: RefCell<PendingQueues<M>>,
}

impl<M: ?Sized + Member> Scheduler<M> {
    /// Create a scheduler without membership hooks
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_hooks(label, NoHooks, &SchedulerConfig::default())
    }
}

impl<M: ?Sized + Member, H: MembershipHooks<M>> Scheduler<M, H> {
    /// Create a scheduler with membership hooks and tuning
    pub fn with_hooks(label: impl Into<String>, hooks: H, config: &SchedulerConfig) -> Self {
        let capacity = config.capacity_hint;
        Self {
            label: label.into(),
            log_flushes: config.log_flushes,
            hooks,
            live: RefCell::new(LiveState {
                members: Vec::with_capacity(capacity),
                admissions: HashMap::with_capacity(capacity),
                update_view: OrderedView::with_capacity(capacity),
                draw_view: OrderedView::with_capacity(capacity),
            }),
            pending: RefCell::new(PendingQueues {
                adds: PendingSet::new(),
                removes: PendingSet::new(),
            }),
        }
    }

    /// Name used in log output
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Membership hooks this scheduler runs
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    // ------------------------------------------------------------------
    // Deferred mutation
    // ------------------------------------------------------------------

    /// Queue a member for admission at the next flush
    ///
    /// Queuing the same member twice before a flush queues it once. A member
    /// rejected by the hooks is a caller bug: see [`Scheduler::try_add`].
    pub fn add(&self, member: Rc<M>) {
        if let Err(err) = self.try_add(member) {
            precondition_failed(&err);
        }
    }

    /// Queue a member for admission, reporting hook rejections as errors
    ///
    /// Returns `Ok(false)` if the member was already queued for admission.
    pub fn try_add(&self, member: Rc<M>) -> Result<bool, SchedulerError> {
        self.hooks.admissible(&member)?;
        let queued = self.pending.borrow_mut().adds.insert(member);
        if !queued {
            trace!("[{}] duplicate add request collapsed", self.label);
        }
        Ok(queued)
    }

    /// Queue several members for admission
    pub fn add_all(&self, members: &[Rc<M>]) {
        self.add_range(members.iter().cloned());
    }

    /// Queue every member of a sequence for admission
    pub fn add_range<I>(&self, members: I)
    where
        I: IntoIterator<Item = Rc<M>>,
    {
        for member in members {
            self.add(member);
        }
    }

    /// Queue a member for retirement at the next flush
    pub fn remove(&self, member: Rc<M>) {
        if !self.pending.borrow_mut().removes.insert(member) {
            trace!("[{}] duplicate remove request collapsed", self.label);
        }
    }

    /// Queue several members for retirement
    pub fn remove_all(&self, members: &[Rc<M>]) {
        self.remove_range(members.iter().cloned());
    }

    /// Queue every member of a sequence for retirement
    pub fn remove_range<I>(&self, members: I)
    where
        I: IntoIterator<Item = Rc<M>>,
    {
        for member in members {
            self.remove(member);
        }
    }

    /// Apply queued requests: every admission first, then every retirement
    pub fn flush(&self) -> FlushSummary {
        let Some(mut live) = self.live_mut() else {
            return FlushSummary::default();
        };
        let mut summary = FlushSummary::default();

        let adds = self.pending.borrow_mut().adds.take();
        for member in adds {
            if self.admit(&mut live, member) {
                summary.admitted += 1;
            } else {
                summary.ignored += 1;
            }
        }

        let removes = self.pending.borrow_mut().removes.take();
        for member in removes {
            if self.retire(&mut live, &member) {
                summary.retired += 1;
            } else {
                summary.ignored += 1;
            }
        }

        if self.log_flushes && !summary.is_noop() {
            debug!(
                "[{}] flush: {} admitted, {} retired, {} ignored ({} members)",
                self.label,
                summary.admitted,
                summary.retired,
                summary.ignored,
                live.members.len()
            );
        }
        summary
    }

    fn live_mut(&self) -> Option<RefMut<'_, LiveState<M>>> {
        if let Ok(live) = self.live.try_borrow_mut() {
            Some(live)
        } else {
            precondition_failed(&SchedulerError::Reentrant(self.label.clone()));
            None
        }
    }

    fn admit(&self, live: &mut LiveState<M>, member: Rc<M>) -> bool {
        let key = MemberKey::of(&member);
        if live.admissions.contains_key(&key) {
            trace!("[{}] add ignored, already a member", self.label);
            return false;
        }
        if let Err(err) = self.hooks.admissible(&member) {
            precondition_failed(&err);
            return false;
        }

        let mut capabilities = Capabilities::empty();

        let update = M::into_schedulable(Rc::clone(&member)).map(|target| {
            capabilities |= Capabilities::SCHEDULABLE;
            let schedule = target.schedule();
            let marker = live.update_view.marker();
            let order = schedule.update_order_changed().subscribe(move |_| marker.mark());
            let label = self.label.clone();
            let activity = schedule.active_changed().subscribe(move |change| {
                trace!("[{label}] member active {} -> {}", change.previous, change.current);
            });
            live.update_view.insert(key, Rc::clone(&target));
            UpdateLink { target, order, activity }
        });

        let draw = M::into_renderable(Rc::clone(&member)).map(|target| {
            capabilities |= Capabilities::RENDERABLE;
            let marker = live.draw_view.marker();
            let order = target
                .render_state()
                .draw_order_changed()
                .subscribe(move |_| marker.mark());
            live.draw_view.insert(key, Rc::clone(&target));
            DrawLink { target, order }
        });

        live.members.push(Rc::clone(&member));
        self.hooks.admitted(&member);
        trace!("[{}] admitted member {:?}", self.label, capabilities);
        live.admissions.insert(key, Admission { member, capabilities, update, draw });
        true
    }

    fn retire(&self, live: &mut LiveState<M>, member: &Rc<M>) -> bool {
        let key = MemberKey::of(member);
        let Some(admission) = live.admissions.remove(&key) else {
            trace!("[{}] remove ignored, not a member", self.label);
            return false;
        };

        admission.unsubscribe();
        if admission.update.is_some() {
            live.update_view.remove(key);
        }
        if admission.draw.is_some() {
            live.draw_view.remove(key);
        }
        live.members.retain(|candidate| MemberKey::of(candidate) != key);
        self.hooks.retired(&admission.member);
        trace!("[{}] retired member {:?}", self.label, admission.capabilities);
        true
    }

    // ------------------------------------------------------------------
    // Frame driver
    // ------------------------------------------------------------------

    /// Flush, re-sort the update view if needed, then update active members
    /// in ascending update order
    pub fn update(&self, time: &GameTime) -> TraversalStats {
        self.flush();
        {
            let Some(mut live) = self.live_mut() else {
                return TraversalStats::default();
            };
            if live.update_view.sort_if_dirty(|member| member.schedule().update_order()) {
                debug!("[{}] update order re-sorted", self.label);
            }
        }

        let live = self.live.borrow();
        let mut stats = TraversalStats::default();
        for member in live.update_view.iter() {
            if member.schedule().is_active() {
                member.update(time);
                stats.visited += 1;
            } else {
                stats.skipped += 1;
            }
        }
        stats
    }

    /// Re-sort the draw view if needed, then draw visible members in
    /// ascending draw order
    ///
    /// Drawing does not flush; membership changes wait for the next update.
    pub fn draw(&self, surface: &mut dyn Surface, time: &GameTime) -> TraversalStats {
        {
            let Some(mut live) = self.live_mut() else {
                return TraversalStats::default();
            };
            if live.draw_view.sort_if_dirty(|member| member.render_state().draw_order()) {
                debug!("[{}] draw order re-sorted", self.label);
            }
        }

        let live = self.live.borrow();
        let mut stats = TraversalStats::default();
        for member in live.draw_view.iter() {
            if member.render_state().is_visible() {
                member.draw(surface, time);
                stats.visited += 1;
            } else {
                stats.skipped += 1;
            }
        }
        stats
    }

    /// Tell every renderable member the graphics device was created
    ///
    /// Visibility is ignored and the view is not re-sorted.
    pub fn graphics_created(&self, device: &dyn GraphicsDevice) {
        debug!("[{}] graphics device `{}` created", self.label, device.name());
        let live = self.live.borrow();
        for member in live.draw_view.iter() {
            member.graphics_created(device);
        }
    }

    /// Tell every renderable member the graphics device was reset
    ///
    /// Visibility is ignored and the view is not re-sorted.
    pub fn graphics_reset(&self, device: &dyn GraphicsDevice) {
        debug!("[{}] graphics device `{}` reset", self.label, device.name());
        let live = self.live.borrow();
        for member in live.draw_view.iter() {
            member.graphics_reset(device);
        }
    }

    // ------------------------------------------------------------------
    // Queries over admitted members, in insertion order
    // ------------------------------------------------------------------

    /// Number of admitted members
    pub fn count(&self) -> usize {
        self.live.borrow().members.len()
    }

    /// Whether no member is admitted
    pub fn is_empty(&self) -> bool {
        self.live.borrow().members.is_empty()
    }

    /// Number of admitted members of concrete type `T`
    pub fn count_of<T: Any>(&self) -> usize {
        self.live
            .borrow()
            .members
            .iter()
            .filter(|member| is_kind::<M, T>(member))
            .count()
    }

    /// First admitted member of concrete type `T`, by insertion order
    pub fn first_of<T: Any>(&self) -> Option<Rc<T>> {
        self.live
            .borrow()
            .members
            .iter()
            .find_map(|member| downcast::<M, T>(member))
    }

    /// Every admitted member of concrete type `T`, by insertion order
    pub fn find_all<T: Any>(&self) -> Vec<Rc<T>> {
        self.live
            .borrow()
            .members
            .iter()
            .filter_map(|member| downcast::<M, T>(member))
            .collect()
    }

    /// Snapshot of every admitted member, by insertion order
    pub fn to_vec(&self) -> Vec<Rc<M>> {
        self.live.borrow().members.clone()
    }

    /// Whether `member` is currently admitted
    pub fn contains(&self, member: &Rc<M>) -> bool {
        self.live.borrow().admissions.contains_key(&MemberKey::of(member))
    }

    /// Views an admitted member was routed into
    pub fn capabilities_of(&self, member: &Rc<M>) -> Option<Capabilities> {
        self.live
            .borrow()
            .admissions
            .get(&MemberKey::of(member))
            .map(|admission| admission.capabilities)
    }

    /// Whether `member` is waiting for admission
    pub fn is_pending_add(&self, member: &Rc<M>) -> bool {
        self.pending.borrow().adds.contains(member)
    }

    /// Whether `member` is waiting for retirement
    pub fn is_pending_remove(&self, member: &Rc<M>) -> bool {
        self.pending.borrow().removes.contains(member)
    }

    /// Queued admissions and retirements
    pub fn pending_len(&self) -> (usize, usize) {
        let pending = self.pending.borrow();
        (pending.adds.len(), pending.removes.len())
    }

    /// Members in the update view
    pub fn update_view_len(&self) -> usize {
        self.live.borrow().update_view.len()
    }

    /// Members in the draw view
    pub fn draw_view_len(&self) -> usize {
        self.live.borrow().draw_view.len()
    }

    /// Update view as it currently stands, without sorting it
    pub fn update_order_snapshot(&self) -> Vec<Rc<dyn Schedulable>> {
        self.live.borrow().update_view.iter().cloned().collect()
    }

    /// Draw view as it currently stands, without sorting it
    pub fn draw_order_snapshot(&self) -> Vec<Rc<dyn Renderable>> {
        self.live.borrow().draw_view.iter().cloned().collect()
    }

    /// Whether the update view will be re-sorted before the next update
    pub fn needs_update_sort(&self) -> bool {
        self.live.borrow().update_view.is_dirty()
    }

    /// Whether the draw view will be re-sorted before the next draw
    pub fn needs_draw_sort(&self) -> bool {
        self.live.borrow().draw_view.is_dirty()
    }
}

fn is_kind<M: ?Sized + Member, T: Any>(member: &Rc<M>) -> bool {
    <M as AsAnyRc>::as_any(&**member).is::<T>()
}

fn downcast<M: ?Sized + Member, T: Any>(member: &Rc<M>) -> Option<Rc<T>> {
    if !is_kind::<M, T>(member) {
        return None;
    }
    <M as AsAnyRc>::into_any_rc(Rc::clone(member)).downcast::<T>().ok()
}

impl<M: ?Sized + Member, H: MembershipHooks<M>> Drop for Scheduler<M, H> {
    fn drop(&mut self) {
        let live = self.live.get_mut();
        for (_, admission) in live.admissions.drain() {
            admission.unsubscribe();
            self.hooks.retired(&admission.member);
        }
    }
}

impl<M: ?Sized + Member, H: MembershipHooks<M>> fmt::Debug for Scheduler<M, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (adds, removes) = self.pending_len();
        f.debug_struct("Scheduler")
            .field("label", &self.label)
            .field("members", &self.count())
            .field("pending_adds", &adds)
            .field("pending_removes", &removes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessDevice, NullSurface};
    use crate::schedule::member::{RenderState, ScheduleState};
    use std::cell::Cell;
    use std::time::Duration;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        schedule: ScheduleState,
        render: RenderState,
        journal: Journal,
        on_update: RefCell<Option<Box<dyn Fn()>>>,
    }

    impl Probe {
        fn new(name: &'static str, update_order: i32, journal: &Journal) -> Rc<Self> {
            Rc::new(Self {
                name,
                schedule: ScheduleState::with_order(update_order),
                render: RenderState::new(),
                journal: Rc::clone(journal),
                on_update: RefCell::new(None),
            })
        }

        fn on_update(&self, hook: impl Fn() + 'static) {
            *self.on_update.borrow_mut() = Some(Box::new(hook));
        }

        fn log(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{event}:{}", self.name));
        }
    }

    impl Member for Probe {
        fn into_schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
            Some(self)
        }

        fn into_renderable(self: Rc<Self>) -> Option<Rc<dyn Renderable>> {
            Some(self)
        }
    }

    impl Schedulable for Probe {
        fn schedule(&self) -> &ScheduleState {
            &self.schedule
        }

        fn update(&self, _time: &GameTime) {
            self.log("update");
            if let Some(hook) = self.on_update.borrow().as_ref() {
                hook();
            }
        }
    }

    impl Renderable for Probe {
        fn render_state(&self) -> &RenderState {
            &self.render
        }

        fn draw(&self, _surface: &mut dyn Surface, _time: &GameTime) {
            self.log("draw");
        }

        fn graphics_created(&self, _device: &dyn GraphicsDevice) {
            self.log("created");
        }

        fn graphics_reset(&self, _device: &dyn GraphicsDevice) {
            self.log("reset");
        }
    }

    /// Update-only member
    struct Ticker {
        schedule: ScheduleState,
        ticks: Cell<u32>,
    }

    impl Ticker {
        fn new(update_order: i32) -> Rc<Self> {
            Rc::new(Self {
                schedule: ScheduleState::with_order(update_order),
                ticks: Cell::new(0),
            })
        }
    }

    impl Member for Ticker {
        fn into_schedulable(self: Rc<Self>) -> Option<Rc<dyn Schedulable>> {
            Some(self)
        }
    }

    impl Schedulable for Ticker {
        fn schedule(&self) -> &ScheduleState {
            &self.schedule
        }

        fn update(&self, _time: &GameTime) {
            self.ticks.set(self.ticks.get() + 1);
        }
    }

    /// Member with no capabilities
    struct Tag;

    impl Member for Tag {}

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn take(journal: &Journal) -> Vec<String> {
        journal.borrow_mut().drain(..).collect()
    }

    fn frame() -> GameTime {
        GameTime::fixed(Duration::from_millis(16), 1)
    }

    #[test]
    fn test_pending_members_are_invisible_until_flush() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);

        scheduler.add(Rc::clone(&a));
        assert_eq!(scheduler.count(), 0);
        assert!(scheduler.is_empty());
        assert!(scheduler.is_pending_add(&a));
        assert!(scheduler.first_of::<Probe>().is_none());
        assert!(scheduler.to_vec().is_empty());

        let summary = scheduler.flush();
        assert_eq!(summary.admitted, 1);
        assert_eq!(scheduler.count(), 1);
        assert!(scheduler.contains(&a));
        assert_eq!(scheduler.pending_len(), (0, 0));
    }

    #[test]
    fn test_snapshots_follow_view_order() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 2, &journal);
        let b = Probe::new("b", 1, &journal);
        b.render.set_draw_order(4);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b)]);
        scheduler.update(&frame());
        scheduler.draw(&mut NullSurface, &frame());

        let updates: Vec<i32> = scheduler
            .update_order_snapshot()
            .iter()
            .map(|member| member.schedule().update_order())
            .collect();
        assert_eq!(updates, vec![1, 2]);

        let draws: Vec<i32> = scheduler
            .draw_order_snapshot()
            .iter()
            .map(|member| member.render_state().draw_order())
            .collect();
        assert_eq!(draws, vec![0, 4]);
    }

    #[test]
    fn test_duplicate_add_admits_once() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);

        assert_eq!(scheduler.try_add(Rc::clone(&a)), Ok(true));
        assert_eq!(scheduler.try_add(Rc::clone(&a)), Ok(false));
        assert_eq!(scheduler.pending_len(), (1, 0));

        let summary = scheduler.flush();
        assert_eq!(summary.admitted, 1);
        assert_eq!(a.schedule.update_order_changed().subscriber_count(), 1);
        assert_eq!(a.schedule.active_changed().subscriber_count(), 1);
        assert_eq!(a.render.draw_order_changed().subscriber_count(), 1);
        assert_eq!(scheduler.update_view_len(), 1);

        scheduler.add(Rc::clone(&a));
        let again = scheduler.flush();
        assert_eq!(again.admitted, 0);
        assert_eq!(again.ignored, 1);
        assert_eq!(scheduler.count(), 1);
        assert_eq!(a.schedule.update_order_changed().subscriber_count(), 1);

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:a"]);
    }

    #[test]
    fn test_ties_keep_insertion_order_and_resort_on_change() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 5, &journal);
        let b = Probe::new("b", 1, &journal);
        let c = Probe::new("c", 5, &journal);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)]);

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:b", "update:a", "update:c"]);
        assert!(!scheduler.needs_update_sort());
        scheduler.draw(&mut NullSurface, &frame());
        assert_eq!(take(&journal), vec!["draw:a", "draw:b", "draw:c"]);
        assert!(!scheduler.needs_draw_sort());

        a.schedule.set_update_order(0);
        assert!(scheduler.needs_update_sort());
        assert!(!scheduler.needs_draw_sort());

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:a", "update:b", "update:c"]);
    }

    #[test]
    fn test_equal_orders_keep_previous_sort() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 2, &journal);
        let b = Probe::new("b", 1, &journal);
        scheduler.add_range(vec![Rc::clone(&a), Rc::clone(&b)]);
        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:b", "update:a"]);

        // b now ties with a; the previous relative order b, a must survive
        b.schedule.set_update_order(2);
        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:b", "update:a"]);
    }

    #[test]
    fn test_inactive_member_is_skipped_but_kept() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        let b = Probe::new("b", 1, &journal);
        let c = Probe::new("c", 2, &journal);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)]);

        b.schedule.set_active(false);
        let stats = scheduler.update(&frame());
        assert_eq!(stats, TraversalStats { visited: 2, skipped: 1 });
        assert_eq!(take(&journal), vec!["update:a", "update:c"]);
        assert_eq!(scheduler.count(), 3);
        assert!(scheduler.contains(&b));

        b.schedule.set_active(true);
        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:a", "update:b", "update:c"]);
    }

    #[test]
    fn test_add_then_remove_in_one_frame_is_net_zero() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        scheduler.add(Rc::clone(&a));
        scheduler.update(&frame());
        take(&journal);

        let x = Probe::new("x", 0, &journal);
        scheduler.add(Rc::clone(&x));
        scheduler.remove(Rc::clone(&x));
        let before = scheduler.count();

        scheduler.update(&frame());
        assert_eq!(scheduler.count(), before);
        assert!(!scheduler.contains(&x));
        assert_eq!(take(&journal), vec!["update:a"]);
        assert_eq!(x.schedule.update_order_changed().subscriber_count(), 0);
        assert_eq!(x.render.draw_order_changed().subscriber_count(), 0);
    }

    #[test]
    fn test_self_removal_takes_effect_next_frame() {
        let journal = journal();
        let scheduler = Rc::new(Scheduler::<Probe>::new("test"));
        let a = Probe::new("a", 1, &journal);
        let b = Probe::new("b", 2, &journal);
        let c = Probe::new("c", 3, &journal);

        let weak_scheduler = Rc::downgrade(&scheduler);
        let weak_b = Rc::downgrade(&b);
        b.on_update(move || {
            if let (Some(scheduler), Some(b)) = (weak_scheduler.upgrade(), weak_b.upgrade()) {
                scheduler.remove(b);
            }
        });
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)]);

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:a", "update:b", "update:c"]);
        assert_eq!(scheduler.count(), 3);
        assert!(scheduler.is_pending_remove(&b));

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:a", "update:c"]);
        assert_eq!(scheduler.count(), 2);
        assert!(!scheduler.contains(&b));
    }

    #[test]
    fn test_member_added_during_traversal_waits_for_next_frame() {
        let journal = journal();
        let scheduler = Rc::new(Scheduler::<Probe>::new("test"));
        let a = Probe::new("a", 0, &journal);
        let late = Probe::new("late", -1, &journal);

        let weak_scheduler = Rc::downgrade(&scheduler);
        let spawned = Rc::clone(&late);
        a.on_update(move || {
            if let Some(scheduler) = weak_scheduler.upgrade() {
                scheduler.add(Rc::clone(&spawned));
            }
        });
        scheduler.add(Rc::clone(&a));

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:a"]);
        assert!(scheduler.is_pending_add(&late));

        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:late", "update:a"]);
    }

    #[test]
    fn test_removing_a_non_member_is_a_noop() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        let stranger = Probe::new("stranger", 0, &journal);
        scheduler.add(Rc::clone(&a));
        scheduler.remove(Rc::clone(&stranger));
        scheduler.remove(Rc::clone(&stranger));

        assert_eq!(scheduler.pending_len(), (1, 1));
        let summary = scheduler.flush();
        assert_eq!(summary, FlushSummary { admitted: 1, retired: 0, ignored: 1 });
        assert_eq!(scheduler.count(), 1);
    }

    #[test]
    fn test_retired_member_is_unsubscribed_and_can_return() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        let b = Probe::new("b", 1, &journal);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b)]);
        scheduler.update(&frame());

        scheduler.remove_all(&[Rc::clone(&a)]);
        scheduler.update(&frame());
        assert_eq!(a.schedule.update_order_changed().subscriber_count(), 0);
        assert_eq!(a.schedule.active_changed().subscriber_count(), 0);
        assert_eq!(a.render.draw_order_changed().subscriber_count(), 0);

        a.schedule.set_update_order(10);
        assert!(!scheduler.needs_update_sort());
        take(&journal);

        scheduler.add(Rc::clone(&a));
        scheduler.update(&frame());
        assert_eq!(take(&journal), vec!["update:b", "update:a"]);
        assert_eq!(a.schedule.update_order_changed().subscriber_count(), 1);
    }

    #[test]
    fn test_membership_follows_set_semantics() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        let b = Probe::new("b", 0, &journal);
        let c = Probe::new("c", 0, &journal);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b)]);
        scheduler.flush();

        // previous {a, b}; add {c, a}; remove {b, c}
        scheduler.add(Rc::clone(&c));
        scheduler.add(Rc::clone(&a));
        scheduler.remove_range(vec![Rc::clone(&b), Rc::clone(&c)]);
        let summary = scheduler.flush();

        assert_eq!(summary, FlushSummary { admitted: 1, retired: 2, ignored: 1 });
        assert!(scheduler.contains(&a));
        assert!(!scheduler.contains(&b));
        assert!(!scheduler.contains(&c));
        assert_eq!(scheduler.count(), 1);
    }

    #[test]
    fn test_draw_uses_visibility_and_draw_order() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        let b = Probe::new("b", 1, &journal);
        let c = Probe::new("c", 2, &journal);
        a.render.set_draw_order(3);
        b.render.set_draw_order(1);
        c.render.set_draw_order(2);
        c.render.set_visible(false);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)]);
        scheduler.update(&frame());
        take(&journal);

        let stats = scheduler.draw(&mut NullSurface, &frame());
        assert_eq!(stats, TraversalStats { visited: 2, skipped: 1 });
        assert_eq!(take(&journal), vec!["draw:b", "draw:a"]);

        b.render.set_draw_order(5);
        assert!(scheduler.needs_draw_sort());
        assert!(!scheduler.needs_update_sort());
        scheduler.draw(&mut NullSurface, &frame());
        assert_eq!(take(&journal), vec!["draw:a", "draw:b"]);
    }

    #[test]
    fn test_draw_does_not_flush() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        scheduler.add(Probe::new("a", 0, &journal));

        let stats = scheduler.draw(&mut NullSurface, &frame());
        assert_eq!(stats, TraversalStats::default());
        assert_eq!(scheduler.count(), 0);
        assert!(take(&journal).is_empty());
    }

    #[test]
    fn test_device_broadcast_ignores_visibility_and_order() {
        let journal = journal();
        let scheduler = Scheduler::<Probe>::new("test");
        let a = Probe::new("a", 0, &journal);
        let b = Probe::new("b", 0, &journal);
        a.render.set_draw_order(9);
        a.render.set_visible(false);
        a.schedule.set_active(false);
        scheduler.add_all(&[Rc::clone(&a), Rc::clone(&b)]);
        scheduler.flush();

        let device = HeadlessDevice::default();
        scheduler.graphics_created(&device);
        scheduler.graphics_reset(&device);
        assert_eq!(take(&journal), vec!["created:a", "created:b", "reset:a", "reset:b"]);
        assert!(scheduler.needs_draw_sort());
    }

    #[test]
    fn test_members_are_routed_by_capability() {
        let journal = journal();
        let scheduler = Scheduler::<dyn Member>::new("mixed");
        let probe: Rc<dyn Member> = Probe::new("p", 0, &journal);
        let ticker: Rc<dyn Member> = Ticker::new(0);
        let tag: Rc<dyn Member> = Rc::new(Tag);
        scheduler.add_all(&[Rc::clone(&probe), Rc::clone(&ticker), Rc::clone(&tag)]);
        scheduler.flush();

        assert_eq!(scheduler.count(), 3);
        assert_eq!(scheduler.update_view_len(), 2);
        assert_eq!(scheduler.draw_view_len(), 1);
        assert_eq!(
            scheduler.capabilities_of(&probe),
            Some(Capabilities::SCHEDULABLE | Capabilities::RENDERABLE)
        );
        assert_eq!(scheduler.capabilities_of(&ticker), Some(Capabilities::SCHEDULABLE));
        assert_eq!(scheduler.capabilities_of(&tag), Some(Capabilities::empty()));

        let stats = scheduler.update(&frame());
        assert_eq!(stats.visited, 2);
        assert_eq!(scheduler.first_of::<Ticker>().map(|t| t.ticks.get()), Some(1));
    }

    #[test]
    fn test_typed_queries_use_insertion_order() {
        let journal = journal();
        let scheduler = Scheduler::<dyn Member>::new("mixed");
        let slow = Ticker::new(9);
        let fast = Ticker::new(1);
        scheduler.add(slow.clone());
        scheduler.add(Probe::new("p", 5, &journal));
        scheduler.add(fast.clone());
        scheduler.update(&frame());

        assert_eq!(scheduler.count_of::<Ticker>(), 2);
        assert_eq!(scheduler.count_of::<Probe>(), 1);
        assert_eq!(scheduler.count_of::<Tag>(), 0);

        let tickers = scheduler.find_all::<Ticker>();
        assert_eq!(tickers.len(), 2);
        assert!(Rc::ptr_eq(&tickers[0], &slow));
        assert!(Rc::ptr_eq(&tickers[1], &fast));

        let first = scheduler.first_of::<Ticker>().unwrap();
        assert!(Rc::ptr_eq(&first, &slow));
        assert!(scheduler.first_of::<Tag>().is_none());
        assert_eq!(scheduler.to_vec().len(), 3);
    }

    #[test]
    fn test_dropping_scheduler_releases_subscriptions() {
        let journal = journal();
        let a = Probe::new("a", 0, &journal);
        {
            let scheduler = Scheduler::<Probe>::new("short-lived");
            scheduler.add(Rc::clone(&a));
            scheduler.flush();
            assert_eq!(a.schedule.update_order_changed().subscriber_count(), 1);
        }
        assert_eq!(a.schedule.update_order_changed().subscriber_count(), 0);
        assert_eq!(a.render.draw_order_changed().subscriber_count(), 0);
        assert_eq!(Rc::strong_count(&a), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "re-entered")]
    fn test_reentrant_update_is_a_precondition_violation() {
        let journal = journal();
        let scheduler = Rc::new(Scheduler::<Probe>::new("test"));
        let a = Probe::new("a", 0, &journal);
        let weak_scheduler = Rc::downgrade(&scheduler);
        a.on_update(move || {
            if let Some(scheduler) = weak_scheduler.upgrade() {
                scheduler.update(&frame());
            }
        });
        scheduler.add(a);
        scheduler.update(&frame());
    }
}
