//! Shared PDF and report fixtures for the CLI tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// Object number of the image drawn on page 2.
pub const IMAGE_OBJ: u32 = 1;

/// A two-page PDF. Page 1 shows a line of text; page 2 draws an image
/// (object [`IMAGE_OBJ`]) inside a Figure with MCID 0. With `tagged`, the
/// catalog carries a structure tree; otherwise an outline.
pub fn two_page_pdf(tagged: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");

    let image_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1i64,
            "Height" => 1i64,
        },
        vec![0],
    )));
    assert_eq!(image_id.0, IMAGE_OBJ);

    let pages_id = doc.new_object_id();
    let c0 = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        b"/P <</MCID 0>> BDC BT /F1 12 Tf 72 720 Td (Annual accessibility report) Tj ET EMC"
            .to_vec(),
    )));
    let c1 = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        b"/Figure <</MCID 0>> BDC q 200 0 0 150 100 300 cm /Im0 Do Q EMC".to_vec(),
    )));
    let p0 = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), 612i64.into(), 792i64.into()],
        "Contents" => c0,
        "Resources" => Object::Dictionary(Dictionary::new()),
    });
    let p1 = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), 612i64.into(), 792i64.into()],
        "Contents" => c1,
        "Resources" => Object::Dictionary(dictionary! {
            "XObject" => Object::Dictionary(dictionary! { "Im0" => image_id }),
        }),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(p0), Object::from(p1)],
            "Count" => 2i64,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if tagged {
        let para = doc.add_object(dictionary! { "S" => "P", "Pg" => p0, "K" => 0i64 });
        let figure = doc.add_object(dictionary! {
            "S" => "Figure",
            "T" => Object::string_literal("Revenue chart"),
            "Pg" => p1,
            "K" => 0i64,
        });
        let document = doc.add_object(dictionary! {
            "S" => "Document",
            "K" => vec![Object::from(para), Object::from(figure)],
        });
        let root = doc.add_object(dictionary! {
            "Type" => "StructTreeRoot",
            "K" => document,
        });
        catalog.set("StructTreeRoot", root);
    } else {
        let outlines_id = doc.new_object_id();
        let entry = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Charts"),
            "Parent" => outlines_id,
            "Dest" => vec![Object::from(p1), Object::Name(b"Fit".to_vec())],
        });
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => entry,
                "Last" => entry,
                "Count" => 1i64,
            }),
        );
        catalog.set("Outlines", outlines_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// Write a fixture PDF into `dir`.
pub fn write_pdf(dir: &Path, name: &str, tagged: bool) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, two_page_pdf(tagged)).unwrap();
    path
}

/// A single scan result for `filename` with three violations:
/// the image (page 2), a page-hinted one (page 1) and a document-level one.
pub fn scan_result_json(filename: &str, filepath: &Path) -> serde_json::Value {
    serde_json::json!({
        "filename": filename,
        "filepath": filepath.display().to_string(),
        "compliant": false,
        "profile": "PDF/UA-1",
        "violations": [
            {
                "rule_id": "7.3-1",
                "description": "Figure without alternate text",
                "object_id": format!("{IMAGE_OBJ} 0 obj"),
                "failed_checks": 1
            },
            {
                "rule_id": "7.2-2",
                "description": "Natural language not determinable",
                "context": "root/document[0]/pages[0](5 0 obj PDPage)",
                "failed_checks": 2
            },
            {
                "rule_id": "7.1-8",
                "description": "Metadata stream missing",
                "failed_checks": 1
            }
        ]
    })
}

pub fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}
