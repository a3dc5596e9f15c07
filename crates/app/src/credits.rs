//! The demo credits sequence: a typed title card, a scrolling list of names
//! with a sparkle overlay, and a closing card.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::predicate::{
    always, at_beat, before_n, every_n_beats, every_off_on, every_on_off,
};
use cadence_core::{Beat, Event, Generator, GeneratorCtx, Result, Scene, SceneManager, Value};

use crate::canvas::Canvas;

pub type SharedCanvas = Rc<RefCell<Canvas>>;

pub const TITLE: &str = "title";
pub const SCROLL: &str = "scroll";
pub const SPARKLE: &str = "sparkle";
pub const FIN: &str = "fin";

/// Manager data key set once the closing card has been shown long enough.
pub const FINISHED: &str = "finished";

const LINE_SPACING: Beat = 2;
const SPARKLES: i64 = 3;

/// Text shown by the sequence.
#[derive(Debug, Clone)]
pub struct Credits {
    pub title: String,
    pub lines: Vec<String>,
}

impl Default for Credits {
    fn default() -> Self {
        Self {
            title: "CADENCE".to_string(),
            lines: [
                "directed by the beat clock",
                "",
                "scenes ........ layered",
                "generators .... gated",
                "events ........ one-shot",
                "",
                "thanks for watching",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// Builds the full credits timeline drawing onto `canvas`.
///
/// The host is expected to call `start_scene(TITLE, 0)` and then drive
/// `request_next` until the manager's [`FINISHED`] flag is set.
pub fn build(credits: &Credits, canvas: &SharedCanvas) -> Result<SceneManager> {
    let height = Beat::from(canvas.borrow().height());
    let title_len = credits.title.chars().count() as Beat;

    let scenes = vec![
        title_scene(credits, canvas)?,
        scroll_scene(credits, canvas),
        sparkle_scene(canvas)?,
        fin_scene(canvas),
    ];

    let title_end = title_len + 8;
    let scroll_len = (credits.lines.len() as Beat).saturating_sub(1) * LINE_SPACING + height;
    let scroll_end = title_end + scroll_len;

    let overlay = canvas.clone();
    let events = vec![
        Event::swap_scene(title_end, SCROLL, 0),
        Event::layer_scene(title_end + 4, SPARKLE, 0),
        Event::new((scroll_end - 4).max(title_end + 5), move |manager| {
            manager.remove_scene(SPARKLE)?;
            overlay.borrow_mut().clear_layer(1);
            Ok(())
        }),
        Event::swap_scene(scroll_end, FIN, 0),
        Event::new(scroll_end + 10, |manager| {
            manager.data_mut().insert(FINISHED, true);
            Ok(())
        }),
    ];

    let mut manager = SceneManager::new(scenes, events)?;
    manager.data_mut().insert(FINISHED, false);
    tracing::debug!(title_end, scroll_end, "credits timeline built");
    Ok(manager)
}

/// Returns true once the closing card has run its course.
pub fn finished(manager: &SceneManager) -> bool {
    manager
        .data()
        .get(FINISHED)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn title_scene(credits: &Credits, canvas: &SharedCanvas) -> Result<Scene> {
    let title_len = credits.title.chars().count() as Beat;

    let typed = canvas.clone();
    let typewriter = Generator::new(0, before_n(title_len))
        .with_data([("text", credits.title.as_str())])
        .on_request(move |ctx, beat| {
            let text = text_of(ctx);
            let shown: String = text.chars().take(beat as usize + 1).collect();
            let mut canvas = typed.borrow_mut();
            let (x, y) = centered(&canvas, &text);
            canvas.set_string(layer_of(ctx), x, y, &shown);
        });

    let (blink_on, blink_off) = (canvas.clone(), canvas.clone());
    let cursor = Generator::new(title_len, every_on_off(2, 2)?)
        .with_data([("text", credits.title.as_str())])
        .on_request(move |ctx, _| {
            let mut canvas = blink_on.borrow_mut();
            let (x, y) = cursor_cell(&canvas, &text_of(ctx));
            canvas.set_char(layer_of(ctx), x, y, '_');
        });
    let cursor_eraser = Generator::new(title_len, every_off_on(2, 2)?)
        .with_data([("text", credits.title.as_str())])
        .on_request(move |ctx, _| {
            let mut canvas = blink_off.borrow_mut();
            let (x, y) = cursor_cell(&canvas, &text_of(ctx));
            canvas.erase(layer_of(ctx), x, y, 1);
        });

    let generators = vec![wipe(canvas), typewriter, cursor, cursor_eraser];
    Ok(Scene::new(TITLE, generators).with_data([("layer", 0)]))
}

fn scroll_scene(credits: &Credits, canvas: &SharedCanvas) -> Scene {
    let mut generators = vec![wipe(canvas)];

    for (index, line) in credits.lines.iter().enumerate() {
        let start = index as Beat * LINE_SPACING;
        let height = Beat::from(canvas.borrow().height());
        let (draw, clear) = (canvas.clone(), canvas.clone());

        let generator = Generator::new(start, before_n(start + height))
            .with_data([("text", line.as_str())])
            .on_request(move |ctx, beat| {
                let text = text_of(ctx);
                let mut canvas = draw.borrow_mut();
                let (x, _) = centered(&canvas, &text);
                let y = scroll_row(&canvas, ctx.start_beat(), beat);
                canvas.set_string(layer_of(ctx), x, y, &text);
            })
            .on_request_clear(move |ctx, beat| {
                let text = text_of(ctx);
                let mut canvas = clear.borrow_mut();
                let (x, _) = centered(&canvas, &text);
                let y = scroll_row(&canvas, ctx.start_beat(), beat);
                canvas.erase(layer_of(ctx), x, y, text.chars().count());
            });
        generators.push(generator);
    }

    Scene::new(SCROLL, generators).with_data([("layer", 0)])
}

fn sparkle_scene(canvas: &SharedCanvas) -> Result<Scene> {
    let mut generators = Vec::new();
    for seed in 0..SPARKLES {
        let (draw, clear) = (canvas.clone(), canvas.clone());
        let generator = Generator::new(seed, every_n_beats(3)?)
            .with_data([("seed", seed)])
            .on_request(move |ctx, beat| {
                let seed = ctx.data().get("seed").and_then(Value::as_int).unwrap_or(0);
                let layer = layer_of(ctx);
                let mut canvas = draw.borrow_mut();
                let x = (beat * 7 + seed * 13).rem_euclid(Beat::from(canvas.width()).max(1));
                let y = (beat * 5 + seed * 3).rem_euclid(Beat::from(canvas.height()).max(1));
                canvas.set_char(layer, x, y, '*');
                ctx.data_mut().set([("x", x), ("y", y)]);
            })
            .on_request_clear(move |ctx, _| {
                let cell = ctx.data().get("x").and_then(Value::as_int).zip(
                    ctx.data().get("y").and_then(Value::as_int),
                );
                if let Some((x, y)) = cell {
                    clear.borrow_mut().erase(layer_of(ctx), x, y, 1);
                }
            });
        generators.push(generator);
    }

    Ok(Scene::new(SPARKLE, generators).with_data([("layer", 1)]))
}

fn fin_scene(canvas: &SharedCanvas) -> Scene {
    let card = canvas.clone();
    let closing = Generator::new(1, always()).on_request(move |ctx, _| {
        let mut canvas = card.borrow_mut();
        let (x, y) = centered(&canvas, "~ fin ~");
        canvas.set_string(layer_of(ctx), x, y, "~ fin ~");
    });

    Scene::new(FIN, vec![wipe(canvas), closing]).with_data([("layer", 0)])
}

/// Clears the scene's layer on the scene's first beat.
fn wipe(canvas: &SharedCanvas) -> Generator {
    let canvas = canvas.clone();
    Generator::new(0, at_beat(0)).on_request(move |ctx, _| {
        canvas.borrow_mut().clear_layer(layer_of(ctx));
    })
}

fn layer_of(ctx: &GeneratorCtx<'_>) -> usize {
    ctx.scene_data()
        .get("layer")
        .and_then(Value::as_int)
        .and_then(|layer| usize::try_from(layer).ok())
        .unwrap_or(0)
}

fn text_of(ctx: &GeneratorCtx<'_>) -> String {
    ctx.data()
        .get("text")
        .and_then(Value::as_text)
        .unwrap_or_default()
        .to_string()
}

fn cursor_cell(canvas: &Canvas, text: &str) -> (i64, i64) {
    let (x, y) = centered(canvas, text);
    (x + text.chars().count() as i64, y)
}

fn centered(canvas: &Canvas, text: &str) -> (i64, i64) {
    let width = i64::from(canvas.width());
    let len = text.chars().count() as i64;
    ((width - len).max(0) / 2, i64::from(canvas.height()) / 2)
}

/// Lines enter at the bottom row and move up one row per beat.
fn scroll_row(canvas: &Canvas, start: Beat, beat: Beat) -> i64 {
    i64::from(canvas.height()) - 1 - (beat - start)
}
