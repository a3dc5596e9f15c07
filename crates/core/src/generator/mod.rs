use std::fmt;

use crate::{Beat, BeatPredicate, DataStore};

/// Callback fired once per scene start.
pub type CreateFn = Box<dyn FnMut(&mut GeneratorCtx<'_>)>;
/// Callback receiving the beat to draw or erase.
pub type RequestFn = Box<dyn FnMut(&mut GeneratorCtx<'_>, Beat)>;

/// View handed to generator callbacks.
///
/// Gives mutable access to the generator's own [`DataStore`] and read access
/// to the stores of the owning scene and, when the scene runs under a
/// [`SceneManager`](crate::SceneManager), the manager.
///
/// Callbacks cannot write to the scene or manager stores. State shared across
/// generators is set by the host through
/// [`SceneManager::set_scene_data`](crate::SceneManager::set_scene_data) and
/// [`SceneManager::data_mut`](crate::SceneManager::data_mut), or by a custom
/// [`Event`](crate::Event) scheduled for the beat it should change on.
pub struct GeneratorCtx<'a> {
    data: &'a mut DataStore,
    index: usize,
    start_beat: Beat,
    scene: &'a str,
    scene_data: &'a DataStore,
    manager_data: Option<&'a DataStore>,
}

impl GeneratorCtx<'_> {
    pub fn data(&self) -> &DataStore {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut *self.data
    }

    /// Position of the generator inside its scene.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn start_beat(&self) -> Beat {
        self.start_beat
    }

    /// Name of the owning scene.
    pub fn scene(&self) -> &str {
        self.scene
    }

    pub fn scene_data(&self) -> &DataStore {
        self.scene_data
    }

    pub fn manager_data(&self) -> Option<&DataStore> {
        self.manager_data
    }
}

/// Everything a scene lends its generators for one callback round.
pub(crate) struct SceneEnv<'a> {
    pub name: &'a str,
    pub start_beat: Beat,
    pub data: &'a DataStore,
    pub manager_data: Option<&'a DataStore>,
}

/// Non-owning link from a generator back to the scene that last started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneBinding {
    pub scene: String,
    pub index: usize,
}

/// What a generator did for a single beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Not started yet, or the condition rejected the beat.
    Inactive,
    /// `request` only: the beat is the scene's or the generator's first.
    Drawn,
    /// `request_clear(beat - 1)` followed by `request(beat)`.
    Redrawn,
}

/// Smallest schedulable unit of a scene.
///
/// A generator holds no drawing logic of its own; it only decides, per beat,
/// which of its injected callbacks run.
pub struct Generator {
    start_beat: Beat,
    condition: BeatPredicate,
    on_create: CreateFn,
    request: RequestFn,
    request_clear: RequestFn,
    binding: Option<SceneBinding>,
    data: DataStore,
}

impl Generator {
    /// Creates a generator whose callbacks are all no-ops.
    pub fn new(start_beat: Beat, condition: BeatPredicate) -> Self {
        Self {
            start_beat,
            condition,
            on_create: Box::new(|_| {}),
            request: Box::new(|_, _| {}),
            request_clear: Box::new(|_, _| {}),
            binding: None,
            data: DataStore::new(),
        }
    }

    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut GeneratorCtx<'_>) + 'static,
    {
        self.on_create = Box::new(f);
        self
    }

    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut GeneratorCtx<'_>, Beat) + 'static,
    {
        self.request = Box::new(f);
        self
    }

    pub fn on_request_clear<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut GeneratorCtx<'_>, Beat) + 'static,
    {
        self.request_clear = Box::new(f);
        self
    }

    /// Seeds the generator's data store at construction time.
    pub fn with_data<K, V, I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<crate::Value>,
    {
        self.data.set(pairs);
        self
    }

    pub fn start_beat(&self) -> Beat {
        self.start_beat
    }

    pub fn condition(&self) -> &BeatPredicate {
        &self.condition
    }

    /// Scene binding established by the most recent scene start, if any.
    pub fn binding(&self) -> Option<&SceneBinding> {
        self.binding.as_ref()
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    /// Pure activation rule: started and accepted by the condition.
    pub fn is_active(&self, beat: Beat) -> bool {
        beat >= self.start_beat && self.condition.evaluate(beat)
    }

    pub(crate) fn bind(&mut self, scene: &str, index: usize) {
        self.binding = Some(SceneBinding {
            scene: scene.to_string(),
            index,
        });
    }

    pub(crate) fn create(&mut self, index: usize, env: &SceneEnv<'_>) {
        let mut ctx = GeneratorCtx {
            data: &mut self.data,
            index,
            start_beat: self.start_beat,
            scene: env.name,
            scene_data: env.data,
            manager_data: env.manager_data,
        };
        (self.on_create)(&mut ctx);
    }

    pub(crate) fn render(
        &mut self,
        index: usize,
        beat: Beat,
        env: &SceneEnv<'_>,
    ) -> Activation {
        if !self.is_active(beat) {
            return Activation::Inactive;
        }

        let mut ctx = GeneratorCtx {
            data: &mut self.data,
            index,
            start_beat: self.start_beat,
            scene: env.name,
            scene_data: env.data,
            manager_data: env.manager_data,
        };

        let activation = if beat != env.start_beat && beat != self.start_beat {
            (self.request_clear)(&mut ctx, beat - 1);
            Activation::Redrawn
        } else {
            Activation::Drawn
        };
        (self.request)(&mut ctx, beat);

        tracing::trace!(scene = env.name, index, beat, ?activation, "generator rendered");
        activation
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("start_beat", &self.start_beat)
            .field("condition", &self.condition)
            .field("binding", &self.binding)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
