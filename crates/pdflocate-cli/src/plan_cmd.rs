use std::path::Path;

use pdflocate::{DrawPlan, Emphasis, ExtractOptions, Label};

use crate::cli::OutputFormat;
use crate::shared::{check_focus, load_report, open_session, print_json, select_result};

pub struct PlanArgs<'a> {
    pub file: &'a Path,
    pub report: &'a Path,
    /// 1-based.
    pub page: usize,
    pub focus: Option<usize>,
    pub file_name: Option<&'a str>,
}

pub fn run(args: PlanArgs<'_>, format: OutputFormat, options: ExtractOptions) -> Result<(), i32> {
    let job = load_report(args.report)?;
    let result = select_result(&job, args.file, args.file_name)?;
    let session = open_session(args.file, options)?;

    let page_count = session.page_count();
    if args.page == 0 || args.page > page_count {
        eprintln!("Error: page {} out of range (1..={page_count})", args.page);
        return Err(1);
    }
    let located = session.locate(result.localizable_violations());
    check_focus(&located, args.focus)?;

    let plan = session
        .plan_page(args.page - 1, &located, args.focus)
        .map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;

    match format {
        OutputFormat::Json => print_json(&plan),
        OutputFormat::Text => {
            write_text(&plan);
            Ok(())
        }
    }
}

fn marker(emphasis: Emphasis) -> &'static str {
    match emphasis {
        Emphasis::Focused => "*",
        Emphasis::Normal => "",
    }
}

fn write_label(kind: &str, label: &Label) {
    println!(
        "{kind}{}\t{:.2}\t{:.2}\t{}",
        marker(label.emphasis),
        label.position.x,
        label.position.y,
        label.text
    );
}

fn write_text(plan: &DrawPlan) {
    println!("kind\tx\ty\tdetail");
    for h in &plan.highlights {
        println!(
            "highlight{}\t{:.2}\t{:.2}\t{:.2}x{:.2} #{}",
            marker(h.emphasis),
            h.region.x0,
            h.region.y0,
            h.region.width(),
            h.region.height(),
            h.violation
        );
    }
    for label in &plan.labels {
        write_label("label", label);
    }
    if let Some(header) = &plan.header {
        write_label("header", &header.title);
        for line in &header.lines {
            write_label("header", line);
        }
        if let Some(summary) = &header.summary {
            write_label("header", summary);
        }
    }
    if let Some(notice) = &plan.notice {
        println!("notice\t-\t-\t{notice}");
    }
}
