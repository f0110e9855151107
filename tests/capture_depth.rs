//! End-to-end tests for depth-aware output capture
//!
//! These live outside the library crate because frames from the library's
//! own modules never count towards call depth.

use tidemark::capture::StackDepth;
use tidemark::cprintln;
use tidemark::prelude::*;

mod helpers {
    use tidemark::cprintln;

    #[inline(never)]
    pub fn level_two() {
        cprintln!("Level 2");
        level_three();
    }

    #[inline(never)]
    pub fn level_three() {
        cprintln!("Level 3");
    }
}

#[inline(never)]
fn level_one(call: Call<()>) -> Ctx<()> {
    cprintln!("Level 1");
    helpers::level_two();
    call.ok(())
}

/// Call depths follow the source on this build and resolve this crate's symbols.
fn depth_available() -> bool {
    StackDepth::is_supported()
        && std::backtrace::Backtrace::force_capture()
            .to_string()
            .contains("capture_depth::depth_available")
}

fn indent_of(ctx: &Ctx<()>, text: &str) -> usize {
    ctx.logs()
        .iter()
        .find(|e| e.text == text)
        .map(|e| e.indent)
        .unwrap_or_else(|| panic!("{:?} not in trace:\n{}", text, render(ctx.logs())))
}

#[test]
fn nested_helpers_indent_by_call_depth() {
    if !depth_available() {
        return;
    }

    let step = decorate("level_one", level_one, DecorateConfig::default());
    let ctx = step.run(()).info("after the call");

    let one = indent_of(&ctx, "Level 1");
    let two = indent_of(&ctx, "Level 2");
    let three = indent_of(&ctx, "Level 3");
    assert!(one < two && two < three, "{}", render(ctx.logs()));

    assert_eq!(one, 4);
    assert_eq!(two, 8);
    assert_eq!(three, 12);
    assert_eq!(indent_of(&ctx, "after the call"), 0);
}

#[test]
fn captured_lines_sit_between_brackets() {
    if !depth_available() {
        return;
    }

    let step = decorate("level_one", level_one, DecorateConfig::default());
    let ctx = step.run(());

    let texts: Vec<&str> = ctx.logs().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["--> level_one", "()", "Level 1", "Level 2", "Level 3", "<-- level_one"]
    );
}

#[test]
fn depth_follows_inherited_base() {
    if !depth_available() {
        return;
    }

    let step = decorate("level_one", level_one, DecorateConfig::default().with_spacing(2));
    let arrived = Vec::<LogEntry>::new().info(Record::new("outer").indent(10));
    let ctx = step.call(Call::with_logs((), arrived));

    assert_eq!(indent_of(&ctx, "--> level_one"), 12);
    assert_eq!(indent_of(&ctx, "Level 1"), 12);
    assert_eq!(indent_of(&ctx, "Level 2"), 14);
    assert_eq!(indent_of(&ctx, "Level 3"), 16);
}

#[test]
fn excluded_modules_do_not_add_depth() {
    if !depth_available() {
        return;
    }

    let config = DecorateConfig::default()
        .with_exclusions(ExclusionMode::Append, ["capture_depth::helpers"]);
    let ctx = decorate("level_one", level_one, config).run(());

    assert_eq!(indent_of(&ctx, "Level 1"), 4);
    assert_eq!(indent_of(&ctx, "Level 2"), 4);
    assert_eq!(indent_of(&ctx, "Level 3"), 4);
}

#[test]
fn basic_mode_ignores_depth() {
    let config = DecorateConfig::default().with_capture(CaptureMode::Basic);
    let ctx = decorate("level_one", level_one, config).run(());

    for text in ["Level 1", "Level 2", "Level 3"] {
        assert_eq!(indent_of(&ctx, text), 4);
    }
}

#[test]
fn concurrent_captures_stay_on_their_threads() {
    let config = DecorateConfig::default().with_capture(CaptureMode::Basic);

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let config = config.clone();
            std::thread::spawn(move || {
                let step = decorate(
                    "worker",
                    |call: Call<usize>| {
                        let n = call.args;
                        for i in 0..3 {
                            cprintln!("worker {} line {}", n, i);
                        }
                        call.ok(n)
                    },
                    config,
                );
                step.run(n)
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let ctx = handle.join().unwrap();
        let printed: Vec<&str> = ctx
            .logs()
            .iter()
            .map(|e| e.text.as_str())
            .filter(|t| t.starts_with("worker "))
            .collect();
        assert_eq!(
            printed,
            (0..3)
                .map(|i| format!("worker {} line {}", n, i))
                .collect::<Vec<_>>()
        );
    }
}
