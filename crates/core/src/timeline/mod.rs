use std::collections::{BTreeMap, HashMap};

use crate::{Beat, DataStore, Event, Result, Scene, TimelineError, Value};

/// Orchestrates named scenes against a global beat clock.
///
/// The active-scene list holds scene names: index 0 is the base layer and
/// every later entry is an overlay rendered on top of it, in order. Events
/// registered for a beat fire right after the clock reaches that beat, so any
/// change they make to the active list shows up in the next render pass.
#[derive(Debug)]
pub struct SceneManager {
    scenes: HashMap<String, Scene>,
    events: BTreeMap<Beat, Vec<Event>>,
    active: Vec<String>,
    cur_beat: Beat,
    data: DataStore,
}

impl SceneManager {
    pub fn new(scenes: Vec<Scene>, events: Vec<Event>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(scenes.len());
        for scene in scenes {
            let name = scene.name().to_string();
            if by_name.contains_key(&name) {
                return Err(TimelineError::DuplicateScene(name));
            }
            by_name.insert(name, scene);
        }

        let mut by_beat: BTreeMap<Beat, Vec<Event>> = BTreeMap::new();
        for event in events {
            by_beat.entry(event.beat()).or_default().push(event);
        }

        Ok(Self {
            scenes: by_name,
            events: by_beat,
            active: Vec::new(),
            cur_beat: -1,
            data: DataStore::new(),
        })
    }

    /// Last beat the clock reached. `-1` until the first advance.
    pub fn cur_beat(&self) -> Beat {
        self.cur_beat
    }

    /// Names of the scenes rendered each frame, base layer first.
    pub fn active_scenes(&self) -> &[String] {
        &self.active
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    /// Number of events that have not fired yet.
    pub fn pending_events(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Replaces the base layer with `name` and starts it at `at`.
    ///
    /// The previous base scene is dropped from the list without any further
    /// callbacks.
    pub fn start_scene(&mut self, name: &str, at: Beat) -> Result<()> {
        let scene = self
            .scenes
            .get_mut(name)
            .ok_or_else(|| TimelineError::UnknownScene(name.to_string()))?;

        match self.active.first_mut() {
            Some(base) => *base = name.to_string(),
            None => self.active.push(name.to_string()),
        }
        tracing::debug!(scene = name, at, active = ?self.active, "base scene replaced");

        scene.start_with(at, Some(&self.data));
        Ok(())
    }

    /// Appends `name` as an overlay and starts it at `at`.
    ///
    /// Adding a scene that is already active renders it twice per frame.
    pub fn add_scene(&mut self, name: &str, at: Beat) -> Result<()> {
        let scene = self
            .scenes
            .get_mut(name)
            .ok_or_else(|| TimelineError::UnknownScene(name.to_string()))?;

        self.active.push(name.to_string());
        tracing::debug!(scene = name, at, active = ?self.active, "overlay added");

        scene.start_with(at, Some(&self.data));
        Ok(())
    }

    /// Drops the first active occurrence of `name`. Inactive scenes are a no-op.
    pub fn remove_scene(&mut self, name: &str) -> Result<()> {
        if !self.scenes.contains_key(name) {
            return Err(TimelineError::UnknownScene(name.to_string()));
        }

        if let Some(pos) = self.active.iter().position(|active| active == name) {
            self.active.remove(pos);
            tracing::debug!(scene = name, active = ?self.active, "scene removed");
        }
        Ok(())
    }

    /// Renders (or skips) one frame on every active scene, then advances the
    /// global clock.
    pub fn request_next(&mut self, render: bool) -> Result<()> {
        for name in &self.active {
            if let Some(scene) = self.scenes.get_mut(name) {
                scene.frame_with(render, Some(&self.data));
            }
        }
        self.next_beat()
    }

    /// Advances the global clock by one beat and fires the events due on it,
    /// in registration order.
    pub fn next_beat(&mut self) -> Result<()> {
        self.cur_beat += 1;
        tracing::trace!(beat = self.cur_beat, "beat advanced");

        if let Some(mut due) = self.events.remove(&self.cur_beat) {
            for event in &mut due {
                event.fire(self)?;
            }
        }
        Ok(())
    }

    pub fn set_scene_data<K, V, I>(&mut self, scene: &str, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.scenes
            .get_mut(scene)
            .ok_or_else(|| TimelineError::UnknownScene(scene.to_string()))?
            .data_mut()
            .set(pairs);
        Ok(())
    }

    pub fn set_generator_data<K, V, I>(
        &mut self,
        scene: &str,
        index: usize,
        pairs: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let generator = self
            .scenes
            .get_mut(scene)
            .ok_or_else(|| TimelineError::UnknownScene(scene.to_string()))?
            .generator_mut(index)
            .ok_or_else(|| TimelineError::UnknownGenerator {
                scene: scene.to_string(),
                index,
            })?;
        generator.data_mut().set(pairs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::predicate::always;
    use crate::Generator;

    type Log = Rc<RefCell<Vec<String>>>;

    fn drawing_scene(name: &'static str, log: &Log) -> Scene {
        let sink = log.clone();
        let generator = Generator::new(0, always())
            .on_request(move |_, b| sink.borrow_mut().push(format!("{name}{b}")));
        Scene::new(name, vec![generator])
    }

    fn manager(log: &Log, events: Vec<Event>) -> SceneManager {
        let scenes = vec![
            drawing_scene("a", log),
            drawing_scene("b", log),
            drawing_scene("c", log),
        ];
        SceneManager::new(scenes, events).unwrap()
    }

    #[test]
    fn clock_starts_before_zero() {
        let mut manager = manager(&Log::default(), Vec::new());
        assert_eq!(manager.cur_beat(), -1);

        manager.next_beat().unwrap();
        assert_eq!(manager.cur_beat(), 0);
    }

    #[test]
    fn duplicate_scene_names_are_rejected() {
        let log = Log::default();
        let scenes = vec![drawing_scene("a", &log), drawing_scene("a", &log)];
        let err = SceneManager::new(scenes, Vec::new()).unwrap_err();
        assert!(matches!(err, TimelineError::DuplicateScene(ref name) if name == "a"));
    }

    #[test]
    fn event_fires_once_when_its_beat_arrives() {
        let fire = Event::new(5, |m: &mut SceneManager| {
            let beat = m.cur_beat();
            m.data_mut().insert("fired_at", beat);
            m.data_mut()
                .apply("count", |v| Value::Int(v.as_int().unwrap_or_default() + 1))
        });
        let mut manager = manager(&Log::default(), vec![fire]);
        manager.data_mut().insert("count", 0);

        for _ in 0..5 {
            manager.next_beat().unwrap();
        }
        assert_eq!(manager.data().get("count"), Some(&Value::Int(0)));

        for _ in 0..10 {
            manager.next_beat().unwrap();
        }
        assert_eq!(manager.data().get("count"), Some(&Value::Int(1)));
        assert_eq!(manager.data().get("fired_at"), Some(&Value::Int(5)));
        assert_eq!(manager.pending_events(), 0);
    }

    #[test]
    fn events_sharing_a_beat_fire_in_registration_order() {
        let events = vec![
            Event::swap_scene(0, "a", 0),
            Event::layer_scene(0, "b", 0),
            Event::layer_scene(0, "c", 0),
        ];
        let log = Log::default();
        let mut manager = manager(&log, events);

        manager.next_beat().unwrap();

        assert_eq!(manager.active_scenes(), ["a", "b", "c"]);
        assert_eq!(*log.borrow(), vec!["a0", "b0", "c0"]);
    }

    #[test]
    fn start_scene_replaces_only_the_base_layer() {
        let log = Log::default();
        let mut manager = manager(&log, Vec::new());

        manager.start_scene("a", 0).unwrap();
        manager.add_scene("b", 0).unwrap();
        manager.start_scene("c", 0).unwrap();

        assert_eq!(manager.active_scenes(), ["c", "b"]);
    }

    #[test]
    fn add_scene_never_touches_the_base_layer() {
        let log = Log::default();
        let mut manager = manager(&log, Vec::new());

        manager.start_scene("a", 0).unwrap();
        manager.add_scene("b", 0).unwrap();
        manager.add_scene("c", 0).unwrap();

        assert_eq!(manager.active_scenes()[0], "a");
        assert_eq!(manager.active_scenes().len(), 3);
    }

    #[test]
    fn add_scene_on_empty_list_becomes_the_base() {
        let mut manager = manager(&Log::default(), Vec::new());
        manager.add_scene("b", 0).unwrap();
        assert_eq!(manager.active_scenes(), ["b"]);
    }

    #[test]
    fn duplicate_overlay_renders_twice() {
        let log = Log::default();
        let mut manager = manager(&log, Vec::new());

        manager.add_scene("a", 0).unwrap();
        manager.add_scene("a", 0).unwrap();
        assert_eq!(manager.active_scenes(), ["a", "a"]);

        log.borrow_mut().clear();
        manager.request_next(true).unwrap();
        // Both passes share the scene's single clock.
        assert_eq!(*log.borrow(), vec!["a1", "a2"]);
    }

    #[test]
    fn remove_scene_drops_first_occurrence_only() {
        let log = Log::default();
        let mut manager = manager(&log, Vec::new());

        manager.start_scene("a", 0).unwrap();
        manager.add_scene("b", 0).unwrap();
        manager.add_scene("b", 0).unwrap();
        manager.remove_scene("b").unwrap();

        assert_eq!(manager.active_scenes(), ["a", "b"]);
    }

    #[test]
    fn removing_an_inactive_scene_is_a_no_op() {
        let log = Log::default();
        let mut manager = manager(&log, Vec::new());

        manager.start_scene("a", 0).unwrap();
        manager.remove_scene("c").unwrap();

        assert_eq!(manager.active_scenes(), ["a"]);
    }

    #[test]
    fn unknown_scene_names_fail_loudly() {
        let mut manager = manager(&Log::default(), Vec::new());

        for result in [
            manager.start_scene("ghost", 0),
            manager.add_scene("ghost", 0),
            manager.remove_scene("ghost"),
            manager.set_scene_data("ghost", [("k", 1)]),
        ] {
            assert!(matches!(result, Err(TimelineError::UnknownScene(ref n)) if n == "ghost"));
        }
        assert!(manager.active_scenes().is_empty());
    }

    #[test]
    fn failing_event_reaches_the_host() {
        let mut manager = manager(&Log::default(), vec![Event::swap_scene(1, "ghost", 0)]);

        manager.next_beat().unwrap();
        let err = manager.next_beat().unwrap_err();
        assert!(matches!(err, TimelineError::UnknownScene(_)));
    }

    #[test]
    fn event_changes_apply_from_the_next_render_pass() {
        let log = Log::default();
        let mut manager = manager(&log, vec![Event::layer_scene(1, "b", 0)]);

        manager.start_scene("a", 0).unwrap();
        manager.request_next(true).unwrap();
        manager.request_next(true).unwrap();
        manager.request_next(true).unwrap();

        assert_eq!(manager.cur_beat(), 2);
        assert_eq!(*log.borrow(), vec!["a0", "a1", "a2", "b0", "a3", "b1"]);
    }

    #[test]
    fn skipped_frames_advance_every_clock() {
        let log = Log::default();
        let mut manager = manager(&log, Vec::new());

        manager.start_scene("a", 0).unwrap();
        manager.request_next(false).unwrap();
        manager.request_next(true).unwrap();

        assert_eq!(manager.cur_beat(), 1);
        assert_eq!(manager.scene("a").map(Scene::internal_beat), Some(3));
        assert_eq!(*log.borrow(), vec!["a0", "a2"]);
    }

    #[test]
    fn data_setters_reach_scenes_and_generators() {
        let mut manager = manager(&Log::default(), Vec::new());

        manager.set_scene_data("a", [("layer", 1)]).unwrap();
        manager.set_generator_data("a", 0, [("text", "hi")]).unwrap();

        let scene = manager.scene("a").unwrap();
        assert_eq!(scene.data().get("layer"), Some(&Value::Int(1)));
        let text = scene.generator(0).and_then(|g| g.data().get("text"));
        assert_eq!(text.and_then(Value::as_text), Some("hi"));

        let err = manager.set_generator_data("a", 4, [("text", "x")]).unwrap_err();
        assert!(matches!(err, TimelineError::UnknownGenerator { index: 4, .. }));
    }

    #[test]
    fn generators_see_manager_data() {
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let reader = Generator::new(0, always()).on_request(move |ctx, _| {
            *sink.borrow_mut() = ctx
                .manager_data()
                .and_then(|d| d.get("speed"))
                .and_then(Value::as_int);
        });
        let scenes = vec![Scene::new("solo", vec![reader])];
        let mut manager = SceneManager::new(scenes, Vec::new()).unwrap();
        manager.data_mut().insert("speed", 3);

        manager.start_scene("solo", 0).unwrap();

        assert_eq!(*seen.borrow(), Some(3));
    }

    #[test]
    fn events_write_manager_data_for_generators() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = Generator::new(0, always()).on_request(move |ctx, _| {
            let mode = ctx.manager_data().and_then(|d| d.get("mode"));
            sink.borrow_mut().push(mode.and_then(Value::as_int));
        });
        let switch = Event::new(1, |m: &mut SceneManager| {
            m.data_mut().insert("mode", 1);
            Ok(())
        });
        let scenes = vec![Scene::new("solo", vec![reader])];
        let mut manager = SceneManager::new(scenes, vec![switch]).unwrap();
        manager.data_mut().insert("mode", 0);

        manager.start_scene("solo", 0).unwrap();
        for _ in 0..3 {
            manager.request_next(true).unwrap();
        }

        assert_eq!(*seen.borrow(), vec![Some(0), Some(0), Some(0), Some(1)]);
    }
}
