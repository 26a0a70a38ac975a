//! Flowpad - line-oriented shell over the flow editor
//!
//! Reads one command per line from stdin. Node widget actions (delete,
//! reshape, relabel, recolour) go through the mutation bus the same way node
//! controls do; toolbar actions call the editor directly.

use flowpad::editor::{FileSlot, FlowEditor, GraphIntent, MutationBus};
use flowpad::{EditorConfig, NodeFields, Shape};
use glam::Vec2;
use log::{info, warn};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  add <rectangle|circle> <x> <y>     create a node
  move <node> <x> <y>                move a node
  connect <node> <handle> <node> <handle>
                                     connect handles (suffix such as source-right)
  shape <node> <rectangle|circle>    change shape
  label <node> <text>                rename
  color <node> <#rrggbb>             recolour
  content <node> <text>              set content
  delete <node>                      delete a node
  undo | redo | clear | list | help | quit
nodes are referenced by 1-based index or id";

fn parse_f32(arg: Option<&str>) -> Option<f32> {
    arg?.parse().ok()
}

/// Resolve a 1-based index or a node id
fn resolve_node(editor: &FlowEditor<FileSlot>, arg: Option<&str>) -> Option<String> {
    let arg = arg?;
    if let Ok(index) = arg.parse::<usize>() {
        return editor.nodes().get(index.checked_sub(1)?).map(|n| n.id.clone());
    }
    editor.node(arg).map(|n| n.id.clone())
}

fn list(editor: &FlowEditor<FileSlot>) {
    for (i, node) in editor.nodes().iter().enumerate() {
        println!(
            "{:>3}. {:<14} {:<9} ({:.0}, {:.0}) {} {}",
            i + 1,
            node.label,
            node.shape.tag(),
            node.position.x,
            node.position.y,
            node.color,
            node.id
        );
    }
    for edge in editor.edges() {
        println!("     {} -> {}", edge.source_handle, edge.target_handle);
    }
    let history = editor.history();
    println!("history {}/{}", history.cursor(), history.len() - 1);
}

fn run_command(editor: &mut FlowEditor<FileSlot>, bus: &MutationBus, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return true;
    };

    match command {
        "add" => {
            let shape = parts.next().map(str::parse::<Shape>);
            match (shape, parse_f32(parts.next()), parse_f32(parts.next())) {
                (Some(Ok(shape)), Some(x), Some(y)) => {
                    let node = editor.create_node(shape, Vec2::new(x, y));
                    println!("added {}", node.label);
                }
                (Some(Err(e)), _, _) => println!("{}", e),
                _ => println!("usage: add <shape> <x> <y>"),
            }
        }
        "move" => match (resolve_node(editor, parts.next()), parse_f32(parts.next()), parse_f32(parts.next())) {
            (Some(id), Some(x), Some(y)) => {
                editor.move_node(&id, Vec2::new(x, y));
                editor.end_drag();
            }
            _ => println!("usage: move <node> <x> <y>"),
        },
        "connect" => {
            let source = resolve_node(editor, parts.next());
            let source_suffix = parts.next();
            let target = resolve_node(editor, parts.next());
            let target_suffix = parts.next();
            match (source, source_suffix, target, target_suffix) {
                (Some(s), Some(sh), Some(t), Some(th)) => {
                    let sh = format!("{}-{}", s, sh);
                    let th = format!("{}-{}", t, th);
                    if let Err(e) = editor.connect(&s, &sh, &t, &th) {
                        println!("{}", e);
                    }
                }
                _ => println!("usage: connect <node> <handle> <node> <handle>"),
            }
        }
        "shape" => match (resolve_node(editor, parts.next()), parts.next().map(str::parse::<Shape>)) {
            (Some(node_id), Some(Ok(new_shape))) => {
                bus.publish(GraphIntent::ChangeNodeShape { node_id, new_shape });
            }
            (_, Some(Err(e))) => println!("{}", e),
            _ => println!("usage: shape <node> <shape>"),
        },
        "label" | "color" | "content" => match resolve_node(editor, parts.next()) {
            Some(node_id) => {
                let value = parts.collect::<Vec<_>>().join(" ");
                let fields = match command {
                    "label" => NodeFields::label(value),
                    "color" => NodeFields::color(value),
                    _ => NodeFields::content(value),
                };
                bus.publish(GraphIntent::UpdateNodeData { node_id, fields });
            }
            None => println!("usage: {} <node> <value>", command),
        },
        "delete" => match resolve_node(editor, parts.next()) {
            Some(node_id) => {
                bus.publish(GraphIntent::DeleteNode { node_id });
            }
            None => println!("usage: delete <node>"),
        },
        "undo" => {
            if !editor.undo() {
                println!("nothing to undo");
            }
        }
        "redo" => {
            if !editor.redo() {
                println!("nothing to redo");
            }
        }
        "clear" => editor.clear(),
        "list" => list(editor),
        "help" => println!("{}", HELP),
        "quit" | "exit" => return false,
        other => println!("unknown command {}, try help", other),
    }

    editor.pump_intents();
    true
}

fn main() -> io::Result<()> {
    let config = EditorConfig::load();
    let filter = config
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| EditorConfig::default().log_filter);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = config.unwrap_or_else(|e| {
        warn!("{}; using default configuration", e);
        EditorConfig::default()
    });

    let slot = FileSlot::in_dir(&config.storage_dir(), &config.storage_key);
    info!("Using storage slot {}", slot.path().display());

    let bus = MutationBus::global();
    let mut editor = FlowEditor::open(&config, slot);
    editor.attach(bus);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if !run_command(&mut editor, bus, line.trim()) {
            break;
        }
    }

    editor.interrupt();
    editor.detach();
    Ok(())
}
