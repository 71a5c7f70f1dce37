use super::*;
use crate::common::Error;
use crate::table::{FactoryInputs, Sheet, SheetSelector, Workbook};
use indexmap::IndexMap;
use std::fs;
use tempfile::TempDir;

const VAV_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ObjectSet ExportMode="Special" Note="TypesFirst" Version="3.2.1.630">
  <MetaInformation>
    <ExportMode Value="Special"/>
    <RuntimeVersion Value="3.2.1.630"/>
    <SourceVersion Value="3.2.1.630"/>
    <ServerFullPath Value="/EBO"/>
  </MetaInformation>
  <Types>
    <ObjectType Name="udt.{{EQUIP}}" Description="keeps {{DESCR}} verbatim"/>
  </Types>
  <ExportedObjects>
    <OI NAME="{{EQUIP}}" TYPE="system.base.Folder" DESCR="{{DESCR}}">
      <OI NAME="ZnTmp" TYPE="server.point.AV" DESCR="{{EQUIP}} zone temperature"/>
    </OI>
  </ExportedObjects>
</ObjectSet>
"#;

const AHU_TEMPLATE: &str = r#"<ObjectSet>
  <ExportedObjects>
    <OI NAME="{{UNIT}}" TYPE="system.base.Folder"/>
  </ExportedObjects>
</ObjectSet>"#;

fn workbook() -> Workbook {
    Workbook::from_sheets(vec![
        Sheet::from_rows(
            "VAV",
            [
                ["{{EQUIP}}", "{{DESCR}}", "{{LEVEL}}"],
                ["VAV-1", "office", "L1"],
                ["VAV-2", "meeting & training", "L2"],
                ["VAV-3", "corridor", "L1"],
            ],
        ),
        Sheet::from_rows("AHU", [["{{UNIT}}"], ["AHU-1"]]),
        Sheet::from_rows("spare", [["{{UNUSED}}"]]),
        Sheet::from_rows("meta", [["{{EQUIP}}"], ["META-ROW"]]),
    ])
}

struct Fixture {
    dir: TempDir,
    inputs: FactoryInputs,
    template: Template,
}

impl Fixture {
    fn new(selector: SheetSelector) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workbook_path = dir.path().join("items.xlsx");
        workbook().save(&workbook_path).unwrap();
        Self {
            inputs: FactoryInputs::open(&workbook_path, &selector).unwrap(),
            template: Template::parse(VAV_TEMPLATE).unwrap(),
            dir,
        }
    }

    fn vav() -> Self {
        Self::new(SheetSelector::Named("VAV".into()))
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn read_document(path: &Path) -> Element {
    Element::parse(&fs::read_to_string(path).unwrap()).unwrap()
}

fn instance_names(document: &Element) -> Vec<String> {
    document
        .child("ExportedObjects")
        .unwrap()
        .child_elements()
        .filter_map(|e| e.attribute("NAME").map(str::to_string))
        .collect()
}

#[test]
fn test_flat_run_writes_one_document() {
    let fixture = Fixture::vav();
    let records = fixture.inputs.to_records();
    let factory = ApplicationFactory::new(
        &fixture.template,
        fixture.inputs.placeholders(),
        &records,
        FactoryOptions::new(),
    )
    .unwrap();

    let mut events = Vec::new();
    let output = fixture.path("apps.xml");
    let written = factory
        .run(&output, None, &mut |event: ProgressEvent| events.push(event))
        .unwrap();

    assert_eq!(written, [output.clone()]);
    let document = read_document(&output);
    assert_eq!(instance_names(&document), ["VAV-1", "VAV-2", "VAV-3"]);

    let second = document
        .child("ExportedObjects")
        .unwrap()
        .child_elements()
        .nth(1)
        .unwrap();
    assert_eq!(second.attribute("DESCR"), Some("meeting & training"));
    let point = second.child("OI").unwrap();
    assert_eq!(point.attribute("DESCR"), Some("VAV-2 zone temperature"));

    assert_eq!(events.first(), Some(&ProgressEvent::CopiesStarted { total: 3 }));
    let processed = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::RecordProcessed { .. }))
        .count();
    assert_eq!(processed, 3);
    assert_eq!(events.last(), Some(&ProgressEvent::DocumentWritten { path: output }));
}

#[test]
fn test_bounded_run_numbers_files_and_repeats_definitions() {
    let fixture = Fixture::vav();
    let records = fixture.inputs.to_records();
    let options = FactoryOptions::new().with_max_items_per_document(2);
    let factory =
        ApplicationFactory::new(&fixture.template, fixture.inputs.placeholders(), &records, options)
            .unwrap();

    let written = factory
        .run(fixture.path("apps.xml"), None, &mut NoProgress)
        .unwrap();
    assert_eq!(written, [fixture.path("apps_1.xml"), fixture.path("apps_2.xml")]);
    assert!(!fixture.path("apps.xml").exists());

    let first = read_document(&written[0]);
    let second = read_document(&written[1]);
    assert_eq!(instance_names(&first), ["VAV-1", "VAV-2"]);
    assert_eq!(instance_names(&second), ["VAV-3"]);

    // Definitions are never substituted and identical in every output
    let types = first.child("Types").unwrap();
    assert_eq!(Some(types), second.child("Types"));
    assert_eq!(types.child_elements().cloned().collect::<Vec<_>>(), fixture.template.types());
    assert_eq!(
        types.child("ObjectType").unwrap().attribute("Name"),
        Some("udt.{{EQUIP}}")
    );
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let fixture = Fixture::vav();
    let records = fixture.inputs.to_records();
    let options = FactoryOptions::new().with_max_items_per_document(2);
    let factory =
        ApplicationFactory::new(&fixture.template, fixture.inputs.placeholders(), &records, options)
            .unwrap();

    let first = factory.run(fixture.path("a.xml"), None, &mut NoProgress).unwrap();
    let second = factory.run(fixture.path("b.xml"), None, &mut NoProgress).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }
}

#[test]
fn test_reserved_sheet_never_feeds_records() {
    let fixture = Fixture::new(SheetSelector::All);
    assert!(fixture.inputs.sheet("meta").is_none());
    assert!(fixture.inputs.records().all(|r| r.sheet() != "meta"));

    let records = fixture.inputs.to_records();
    let factory = ApplicationFactory::new(
        &fixture.template,
        fixture.inputs.placeholders(),
        &records,
        FactoryOptions::new(),
    )
    .unwrap();
    let output = fixture.path("all.xml");
    factory.run(&output, None, &mut NoProgress).unwrap();
    assert!(!fs::read_to_string(&output).unwrap().contains("META-ROW"));
}

#[test]
fn test_grouped_run_creates_folders() {
    let fixture = Fixture::vav();
    let records = fixture.inputs.to_records();
    let factory = ApplicationFactory::new(
        &fixture.template,
        fixture.inputs.placeholders(),
        &records,
        FactoryOptions::new(),
    )
    .unwrap();

    let output = fixture.path("grouped.xml");
    factory.run(&output, Some("{{LEVEL}}"), &mut NoProgress).unwrap();
    let document = read_document(&output);
    assert_eq!(instance_names(&document), ["L1", "L2"]);

    let level_one = document.child("ExportedObjects").unwrap().child("OI").unwrap();
    assert_eq!(level_one.attribute("TYPE"), Some("system.base.Folder"));
    let names: Vec<_> = level_one
        .child_elements()
        .filter_map(|e| e.attribute("NAME"))
        .collect();
    assert_eq!(names, ["VAV-1", "VAV-3"]);
}

#[test]
fn test_unknown_group_literal_fails() {
    let fixture = Fixture::vav();
    let records = fixture.inputs.to_records();
    let factory = ApplicationFactory::new(
        &fixture.template,
        fixture.inputs.placeholders(),
        &records,
        FactoryOptions::new(),
    )
    .unwrap();
    let err = factory
        .run(fixture.path("x.xml"), Some("{{NOPE}}"), &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, Error::GroupKey { matches: 0, .. }));
}

#[test]
fn test_no_records_writes_nothing() {
    let fixture = Fixture::vav();
    let factory = ApplicationFactory::new(
        &fixture.template,
        fixture.inputs.placeholders(),
        &[],
        FactoryOptions::new(),
    )
    .unwrap();
    let output = fixture.path("empty.xml");
    assert!(factory.run(&output, None, &mut NoProgress).unwrap().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_output_paths() {
    let template = Template::default();
    let placeholders = crate::table::PlaceholderMap::new();
    let unbounded =
        ApplicationFactory::new(&template, &placeholders, &[], FactoryOptions::new()).unwrap();
    assert_eq!(
        unbounded.output_paths(Path::new("out/apps.xml"), 1),
        [PathBuf::from("out/apps.xml")]
    );

    let bounded = ApplicationFactory::new(
        &template,
        &placeholders,
        &[],
        FactoryOptions::new().with_max_items_per_document(10),
    )
    .unwrap();
    assert_eq!(
        bounded.output_paths(Path::new("out/apps.xml"), 2),
        [PathBuf::from("out/apps_1.xml"), PathBuf::from("out/apps_2.xml")]
    );
    assert_eq!(
        bounded.output_paths(Path::new("apps"), 1),
        [PathBuf::from("apps_1")]
    );
}

const NOTE_TEMPLATE: &str = r#"<ObjectSet>
  <ExportedObjects>
    <OI NAME="{{EQUIP}}" TYPE="system.base.Folder"><Note>{{DESCR}}</Note></OI>
  </ExportedObjects>
</ObjectSet>"#;

/// Inputs whose second record turns `<Note>` into malformed markup.
fn malformed_inputs() -> FactoryInputs {
    let workbook = Workbook::from_sheets(vec![Sheet::from_rows(
        "VAV",
        [
            ["{{EQUIP}}", "{{DESCR}}"],
            ["VAV-1", "office"],
            ["VAV-2", "<broken"],
            ["VAV-3", "corridor"],
        ],
    )]);
    FactoryInputs::from_workbook(&workbook, &SheetSelector::All).unwrap()
}

fn xml_files(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
        .collect()
}

fn assert_substitution_error(err: Error) {
    match err {
        Error::Substitution { sheet, row, .. } => {
            assert_eq!(sheet, "VAV");
            assert_eq!(row, 3);
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_record_aborts_run_without_output() {
    let inputs = malformed_inputs();
    let records = inputs.to_records();
    let template = Template::parse(NOTE_TEMPLATE).unwrap();

    for max_items in [0, 1] {
        let dir = tempfile::tempdir().unwrap();
        let options = FactoryOptions::new().with_max_items_per_document(max_items);
        let factory =
            ApplicationFactory::new(&template, inputs.placeholders(), &records, options).unwrap();

        let err = factory
            .run(dir.path().join("apps.xml"), None, &mut NoProgress)
            .unwrap_err();
        assert_substitution_error(err);
        assert!(xml_files(dir.path()).is_empty(), "max_items {max_items}");
    }
}

#[test]
fn test_manager_aborts_before_writing_any_batch() {
    for max_items in [0, 1] {
        let dir = tempfile::tempdir().unwrap();
        let templates = [("VAV".to_string(), Template::parse(NOTE_TEMPLATE).unwrap())]
            .into_iter()
            .collect();
        let manager = FactoryManager::new(
            malformed_inputs(),
            templates,
            dir.path().join("apps"),
            FactoryOptions::new().with_max_items_per_document(max_items),
        );

        let err = manager.make_documents(&mut NoProgress).unwrap_err();
        assert_substitution_error(err);
        assert!(!dir.path().join("apps_VAV_1.xml").exists());
        assert!(xml_files(dir.path()).is_empty(), "max_items {max_items}");
    }
}

fn templates() -> IndexMap<String, Template> {
    [
        ("VAV".to_string(), Template::parse(VAV_TEMPLATE).unwrap()),
        ("AHU".to_string(), Template::parse(AHU_TEMPLATE).unwrap()),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_manager_writes_per_group_batches() {
    let fixture = Fixture::new(SheetSelector::All);
    let mut templates = templates();
    templates.insert("spare".into(), Template::parse(AHU_TEMPLATE).unwrap());
    let manager = FactoryManager::new(
        fixture.inputs.clone(),
        templates,
        fixture.path("apps"),
        FactoryOptions::new().with_max_items_per_document(2),
    );

    let written = manager.make_documents(&mut NoProgress).unwrap();
    assert_eq!(
        written,
        [
            fixture.path("apps_VAV_1.xml"),
            fixture.path("apps_VAV_2.xml"),
            fixture.path("apps_AHU_1.xml"),
        ]
    );
    assert!(!fixture.path("apps_spare_1.xml").exists());

    assert_eq!(instance_names(&read_document(&written[1])), ["VAV-3"]);
    let ahu = read_document(&written[2]);
    assert_eq!(instance_names(&ahu), ["AHU-1"]);
    assert!(ahu.child("Types").is_none());
}

#[test]
fn test_manager_requires_template_per_group() {
    let fixture = Fixture::new(SheetSelector::All);
    let mut templates = templates();
    templates.shift_remove("AHU");
    let manager = FactoryManager::new(
        fixture.inputs.clone(),
        templates,
        fixture.path("apps"),
        FactoryOptions::new(),
    );

    let err = manager.make_documents(&mut NoProgress).unwrap_err();
    assert!(matches!(err, Error::MissingTemplate(ref group) if group == "AHU"));
    assert!(!fixture.path("apps_VAV_1.xml").exists());
}

#[test]
fn test_job_file_drives_manager() {
    let fixture = Fixture::vav();
    fs::write(fixture.path("vav.xml"), VAV_TEMPLATE).unwrap();
    fs::create_dir(fixture.path("out")).unwrap();
    let job = "workbook: items.xlsx\n\
               output_prefix: out/apps\n\
               sheets: [VAV]\n\
               templates:\n  VAV: vav.xml\n\
               document:\n  version: \"6.0.4.90\"\n  server_full_path: /Server 1\n";
    fs::write(fixture.path("job.yaml"), job).unwrap();

    let manager = FactoryManager::open_job(fixture.path("job.yaml")).unwrap();
    assert!(manager.options().max_items_per_document.is_none());
    let written = manager.make_documents(&mut TracingProgress).unwrap();
    assert_eq!(written, [fixture.path("out/apps_VAV_1.xml")]);

    let document = read_document(&written[0]);
    assert_eq!(document.attribute("Version"), Some("6.0.4.90"));
    let meta = document.child("MetaInformation").unwrap();
    assert_eq!(
        meta.child("ServerFullPath").and_then(|e| e.attribute("Value")),
        Some("/Server 1")
    );
    assert_eq!(instance_names(&document).len(), 3);
}

#[test]
fn test_job_rejects_unknown_fields_and_empty_templates() {
    let err = JobConfig::from_yaml_str("workbook: a.xlsx\noutput_prefix: o\ntemplates: {}\n")
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = JobConfig::from_yaml_str(
        "workbook: a.xlsx\noutput_prefix: o\ntemplates:\n  A: a.xml\nmax_items: 3\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_job_yaml_round_trip() {
    let mut job = JobConfig {
        workbook: "items.xlsx".into(),
        output_prefix: "out/apps".into(),
        max_items_per_document: Some(300),
        ..Default::default()
    };
    job.templates.insert("ICG".into(), "templates/icg.xml".into());
    job.document = job.document.with_version("6.0.4.90");

    let yaml = job.to_yaml_string().unwrap();
    assert_eq!(JobConfig::from_yaml_str(&yaml).unwrap(), job);
    assert_eq!(
        job.factory_options().max_items_per_document,
        std::num::NonZeroUsize::new(300)
    );
}
