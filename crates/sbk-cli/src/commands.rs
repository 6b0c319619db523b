use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;
use colored::Colorize;
use serde::Serialize;

use sbk_convert::{
    convert, pack, unpack, Archive, ConvertConfig, ConvertError, ConvertSummary, Endpoint,
    OutputMode,
};
use sbk_graph::{ItemKind, PropertyMap, TripleIndex, ROOT_URI};
use sbk_tree::{Node, NodeId, ReportSummary, Tree};

use crate::cli::*;

/// Failures decided by the command layer rather than a library.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("{failures} item(s) were skipped")]
    Incomplete { failures: usize },
}

/// Process exit code for a failed command.
///
/// 1 means the archive graph could not be loaded, 2 any other failure.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ConvertError>() {
        Some(e) if e.is_graph_error() => 1,
        _ => 2,
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = Session {
        source: &cli.source,
        format: cli.format,
    };
    match cli.command {
        None | Some(Command::Tree) => cmd_tree(&ctx),
        Some(Command::Items) => cmd_items(&ctx),
        Some(Command::Props(args)) => cmd_props(&ctx, args),
        Some(Command::Item(args)) => cmd_item(&ctx, args),
        Some(Command::Convert(args)) => cmd_convert(&ctx, args),
        Some(Command::Pack(args)) => cmd_pack(args),
        Some(Command::Unpack(args)) => cmd_unpack(args),
    }
}

struct Session<'a> {
    source: &'a Path,
    format: OutputFormat,
}

impl Session<'_> {
    fn archive(&self) -> Archive {
        Archive::open(self.source, ConvertConfig::default())
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// --- inspection ---

#[derive(Serialize)]
struct Entry<'a> {
    id: &'a str,
    kind: ItemKind,
    name: &'a str,
}

#[derive(Serialize)]
struct NodeView<'a> {
    node: &'a Node,
    entries: Vec<Entry<'a>>,
}

fn node_view(tree: &Tree, id: NodeId) -> NodeView<'_> {
    NodeView {
        node: tree.node(id),
        entries: tree
            .children(id)
            .map(|(_, child)| Entry {
                id: &child.id,
                kind: child.kind,
                name: &child.name,
            })
            .collect(),
    }
}

/// Node heading plus one `id   name` line per child; folders get a `\`.
fn render_node(tree: &Tree, id: NodeId) -> String {
    let node = tree.node(id);
    let heading = if id == tree.root_id() {
        "(root)"
    } else {
        node.display_title()
    };
    let mut out = format!("{}\n", heading.bold());
    for (_, child) in tree.children(id) {
        let name = if child.is_folder() {
            format!("\\{}", child.name).cyan().bold().to_string()
        } else {
            child.name.clone()
        };
        let _ = writeln!(out, "{}   {name}", child.id.dimmed());
    }
    out
}

fn render_report(report: &ReportSummary) -> String {
    let mut out = String::new();
    let lost = format!("Lost items: {}", report.lost_items);
    let _ = writeln!(
        out,
        "{}",
        if report.lost_items > 0 { lost.yellow() } else { lost.normal() }
    );
    if report.lost_folders > 0 {
        let _ = writeln!(out, "{}", format!("Lost folders: {}", report.lost_folders).yellow());
    }
    if report.shared > 0 {
        let _ = writeln!(out, "Shared references: {}", report.shared);
    }
    for failure in &report.failures {
        let _ = writeln!(out, "{} {failure}", "✗".red().bold());
    }
    out
}

fn cmd_tree(ctx: &Session) -> anyhow::Result<()> {
    let tree = ctx.archive().load_tree()?;
    let summary = tree.report().summary();
    if ctx.json() {
        #[derive(Serialize)]
        struct Out<'a> {
            root: NodeView<'a>,
            report: &'a ReportSummary,
        }
        return print_json(&Out {
            root: node_view(&tree, tree.root_id()),
            report: &summary,
        });
    }
    print!("{}", render_node(&tree, tree.root_id()));
    print!("{}", render_report(&summary));
    Ok(())
}

fn cmd_item(ctx: &Session, args: IdArgs) -> anyhow::Result<()> {
    let tree = ctx.archive().load_tree()?;
    let id = if args.id == ROOT_URI {
        tree.root_id()
    } else {
        tree.find(&args.id)
            .ok_or_else(|| CommandError::UnknownItem(args.id.clone()))?
    };
    if ctx.json() {
        return print_json(&node_view(&tree, id));
    }
    print!("{}", render_node(&tree, id));
    Ok(())
}

/// Property counts keyed by id, the root first.
fn item_counts(index: &TripleIndex) -> Vec<(&str, usize)> {
    std::iter::once((ROOT_URI, index.root_properties().len()))
        .chain(index.ids().map(|id| {
            let count = index.properties(id).map_or(0, PropertyMap::len);
            (id, count)
        }))
        .collect()
}

fn cmd_items(ctx: &Session) -> anyhow::Result<()> {
    let index = ctx.archive().load_index()?;
    let counts = item_counts(&index);
    if ctx.json() {
        let map: std::collections::BTreeMap<_, _> = counts.into_iter().collect();
        return print_json(&map);
    }
    for (id, count) in counts {
        println!("{id}={count}");
    }
    println!("{}", format!("{} item(s)", index.len()).dimmed());
    Ok(())
}

fn lookup_properties<'a>(index: &'a TripleIndex, id: &str) -> Result<&'a PropertyMap, CommandError> {
    if id == ROOT_URI {
        return Ok(index.root_properties());
    }
    index
        .properties(id)
        .ok_or_else(|| CommandError::UnknownItem(id.to_string()))
}

fn cmd_props(ctx: &Session, args: IdArgs) -> anyhow::Result<()> {
    let index = ctx.archive().load_index()?;
    let props = lookup_properties(&index, &args.id)?;
    if ctx.json() {
        return print_json(props);
    }
    for name in props.keys() {
        println!("{name}");
    }
    Ok(())
}

// --- conversion ---

/// Config file settings, overridden by flags that were given.
fn resolve_config(args: &ConvertArgs) -> anyhow::Result<ConvertConfig> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    if args.container {
        config.mode = OutputMode::Container;
    }
    if args.no_sidecars {
        config.sidecars = false;
    }
    config.strict |= args.strict;
    config.overwrite |= args.overwrite;
    Ok(config)
}

fn render_convert(summary: &ConvertSummary, out: &Path) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "{} Converted into {}",
        "✓".green().bold(),
        out.display().to_string().bold()
    );
    let _ = writeln!(text, "  Folders:    {}", summary.folders);
    let _ = writeln!(text, "  Notes:      {}", summary.notes);
    let _ = writeln!(text, "  Pages:      {}", summary.pages);
    if summary.containers > 0 {
        let _ = writeln!(text, "  Containers: {}", summary.containers);
    }
    if summary.sidecars > 0 {
        let _ = writeln!(text, "  Sidecars:   {}", summary.sidecars.to_string().dimmed());
    }
    if summary.skipped > 0 {
        let _ = writeln!(text, "  Skipped:    {}", summary.skipped.to_string().yellow());
    }
    for failure in &summary.failures {
        let _ = writeln!(text, "{} {failure}", "✗".red().bold());
    }
    text
}

fn cmd_convert(ctx: &Session, args: ConvertArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let archive = Archive::open(ctx.source, config);
    let tree = archive.load_tree()?;
    let report = convert(&tree, &archive.data_path(), &args.out, archive.config())
        .with_context(|| format!("converting into {}", args.out.display()))?;

    let resolved = tree.report().summary();
    let converted = report.summary();
    if ctx.json() {
        #[derive(Serialize)]
        struct Out<'a> {
            resolve: &'a ReportSummary,
            convert: &'a ConvertSummary,
        }
        print_json(&Out {
            resolve: &resolved,
            convert: &converted,
        })?;
    } else {
        print!("{}", render_report(&resolved));
        print!("{}", render_convert(&converted, &args.out));
    }

    let failures = resolved.failures.len() + converted.failures.len();
    if failures > 0 {
        return Err(CommandError::Incomplete { failures }.into());
    }
    Ok(())
}

fn cmd_pack(args: PackArgs) -> anyhow::Result<()> {
    let target = Endpoint::parse(&args.mht);
    let bytes = pack(&args.dir, &target, args.overwrite)?;
    if matches!(target, Endpoint::File(_)) {
        eprintln!(
            "{} Packed {} into {bytes} bytes",
            "✓".green().bold(),
            args.dir.display().to_string().bold()
        );
    }
    Ok(())
}

fn cmd_unpack(args: PackArgs) -> anyhow::Result<()> {
    let source = Endpoint::parse(&args.mht);
    let written = unpack(&source, &args.dir, args.overwrite)?;
    eprintln!(
        "{} Unpacked {} file(s) into {}",
        "✓".green().bold(),
        written.len(),
        args.dir.display().to_string().bold()
    );
    Ok(())
}
