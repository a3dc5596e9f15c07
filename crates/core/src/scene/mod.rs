use crate::generator::{Activation, SceneEnv};
use crate::{Beat, DataStore, Generator, Value};

/// Ordered collection of generators sharing one private beat clock.
#[derive(Debug)]
pub struct Scene {
    name: String,
    generators: Vec<Generator>,
    start_beat: Beat,
    internal_beat: Beat,
    data: DataStore,
}

impl Scene {
    pub fn new(name: impl Into<String>, generators: Vec<Generator>) -> Self {
        Self {
            name: name.into(),
            generators,
            start_beat: 0,
            internal_beat: 0,
            data: DataStore::new(),
        }
    }

    /// Seeds the scene's data store at construction time.
    pub fn with_data<K, V, I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.data.set(pairs);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_beat(&self) -> Beat {
        self.start_beat
    }

    /// Beat the next call to [`Scene::request_frame`] will evaluate.
    pub fn internal_beat(&self) -> Beat {
        self.internal_beat
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn generator(&self, index: usize) -> Option<&Generator> {
        self.generators.get(index)
    }

    pub fn generator_mut(&mut self, index: usize) -> Option<&mut Generator> {
        self.generators.get_mut(index)
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    /// Restarts the scene at beat `at` outside of any manager.
    ///
    /// Rebinds and re-creates every generator, resets the clock and renders
    /// the frame for `at` before returning.
    pub fn start(&mut self, at: Beat) {
        self.start_with(at, None);
    }

    /// Renders the current beat when `render` is set, then advances the clock.
    pub fn request_frame(&mut self, render: bool) {
        self.frame_with(render, None);
    }

    pub(crate) fn start_with(&mut self, at: Beat, manager_data: Option<&DataStore>) {
        tracing::debug!(scene = %self.name, at, "starting scene");

        let env = SceneEnv {
            name: &self.name,
            start_beat: at,
            data: &self.data,
            manager_data,
        };
        for (index, generator) in self.generators.iter_mut().enumerate() {
            generator.bind(env.name, index);
            generator.create(index, &env);
        }

        self.start_beat = at;
        self.internal_beat = at;
        self.frame_with(true, manager_data);
    }

    pub(crate) fn frame_with(&mut self, render: bool, manager_data: Option<&DataStore>) {
        let beat = self.internal_beat;
        if render {
            let env = SceneEnv {
                name: &self.name,
                start_beat: self.start_beat,
                data: &self.data,
                manager_data,
            };
            let mut active = 0usize;
            for (index, generator) in self.generators.iter_mut().enumerate() {
                if generator.render(index, beat, &env) != Activation::Inactive {
                    active += 1;
                }
            }
            tracing::trace!(scene = %self.name, beat, active, "frame rendered");
        }

        self.internal_beat += 1;
    }
}
