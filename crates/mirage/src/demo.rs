//! Built-in demo: a small program stopped at a breakpoint.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use mirage_core::prelude::*;
use mirage_protocol::{to_json_protocol, BreakPointHit, DebugEvent, ProtocolValue, Session};
use mirage_utils::info;

const SOURCE: &str = "\
function Counter(start) {
  this.count = start;
}
Counter.prototype.bump = function (by) {
  var next = this.count + by;
  this.count = next;
  return next;
};
var counter = new Counter(40);
counter.bump(2);
";

pub fn run(out: &mut impl Write) -> Result<(), Box<dyn Error>>
{
    let script = Arc::new(Script::new(1, Some("counter.js"), SOURCE));

    let mut heap = HeapSnapshot::new();
    let counter_fn = heap.add_function("Counter", "function Counter(start) {\n  this.count = start;\n}");
    heap.set_function_script(counter_fn, Arc::clone(&script));
    let bump = heap.add_function("", "function (by) {\n  var next = this.count + by;\n  this.count = next;\n  return next;\n}");
    heap.set_function_script(bump, Arc::clone(&script));
    if let Some(prototype) = heap.get_property(counter_fn, "prototype").as_object() {
        heap.set_property(prototype, "bump", bump.into());
    }
    let counter = heap.add_instance(counter_fn);
    heap.set_property(counter, "count", HostValue::from(40));

    let top = heap.add_function("", SOURCE);
    heap.set_function_script(top, Arc::clone(&script));
    let global = heap.add_object("global");
    heap.set_property(global, "counter", counter.into());

    // stopped on "this.count = next;"
    let position = SOURCE.find("this.count = next").unwrap_or_default();
    let break_id = heap.suspend(vec![
        RawFrame {
            frame_id: 1,
            receiver: counter.into(),
            function: bump.into(),
            arguments: vec![(Some("by".to_string()), HostValue::from(2))],
            locals: vec![("next".to_string(), HostValue::from(42))],
            source_position: Some(position),
            ..RawFrame::default()
        },
        RawFrame {
            frame_id: 2,
            receiver: global.into(),
            function: top.into(),
            source_position: SOURCE.find("counter.bump"),
            ..RawFrame::default()
        },
    ]);
    info!(%break_id, "demo program suspended");

    let mut session = Session::new();
    let state = ExecutionState::new(&heap, break_id);
    let event = DebugEvent::Break {
        state,
        break_points_hit: vec![BreakPointHit {
            number: 1,
            script_break_point: None,
        }],
    };
    writeln!(out, "{}", session.render_event(&event))?;

    writeln!(out, "\n> backtrace")?;
    for index in 0..state.frame_count()? {
        writeln!(out, "{}", state.frame(index)?.to_text(true)?)?;
    }

    let line = session.state().current_source_line.unwrap_or_default();
    if let Some(slice) = script.source_slice(Some(line.saturating_sub(2)), Some(line + 3)) {
        let response = ProtocolValue::object()
            .with("success", true)
            .with("running", false)
            .with("command", "source")
            .with(
                "body",
                ProtocolValue::object()
                    .with("source", slice.source_text)
                    .with("fromLine", slice.from_line)
                    .with("toLine", slice.to_line),
            );
        writeln!(out, "\n> source")?;
        write!(out, "{}", session.render_response(&response.to_json()).text)?;
    }

    let frame = state.frame(0)?;
    writeln!(out, "\n> print this")?;
    writeln!(out, "{}", to_json_protocol(&frame.receiver()?, true)?)?;
    writeln!(out, "\n> frame 0")?;
    writeln!(out, "{}", to_json_protocol(&Mirror::Frame(frame), false)?)?;
    Ok(())
}
