//! Container discovery and image updates on release manifests

use pretty_assertions::assert_eq;
use shipyard_manifest::{
    Image, ImageShape, ManifestError, RELEASE_CONTAINER_NAME, Resource, ResourceSet, Workload,
    parse_multidoc, update_container_image,
};

const MARIADB_KEY: &str = "maria:fluxhelmrelease/mariadb";

/// A mariadb release whose `spec.values` block is `values`, given at column 0
fn mariadb(values: &str) -> String {
    let mut doc = String::from(
        "apiVersion: helm.integrations.flux.weave.works/v1alpha2
kind: FluxHelmRelease
metadata:
  name: mariadb
  namespace: maria
  labels:
    chart: mariadb
spec:
  chartGitPath: mariadb
  values:
",
    );
    for line in values.lines() {
        if !line.is_empty() {
            doc.push_str("    ");
            doc.push_str(line);
        }
        doc.push('\n');
    }
    doc
}

fn parse(doc: &str) -> ResourceSet {
    parse_multidoc(doc.as_bytes(), "test").unwrap()
}

fn workload<'a>(set: &'a mut ResourceSet, key: &str) -> &'a mut dyn Workload {
    set.get_mut(key)
        .unwrap_or_else(|| panic!("{key} not found"))
        .as_workload_mut()
        .unwrap_or_else(|| panic!("{key} is not a workload"))
}

/// Retag the only container of the mariadb release and check it reads back
fn retag_single(doc: &str, expected_name: &str) -> String {
    let mut set = parse(doc);
    let release = workload(&mut set, MARIADB_KEY);

    let containers = release.containers().unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, expected_name);
    assert_eq!(containers[0].image.to_string(), "bitnami/mariadb:10.1.30-r1");

    let new_image = containers[0].image.with_new_tag("some-other-tag");
    release
        .set_container_image(expected_name, &new_image)
        .unwrap();

    let containers = release.containers().unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, expected_name);
    assert_eq!(containers[0].image, new_image);

    set.get(MARIADB_KEY).unwrap().bytes().to_string()
}

#[test]
fn test_image_only_format() {
    let doc = mariadb(
        "first: post
image: bitnami/mariadb:10.1.30-r1
persistence:
  enabled: false
",
    );
    let patched = retag_single(&doc, RELEASE_CONTAINER_NAME);

    assert_eq!(
        patched,
        doc.replace("mariadb:10.1.30-r1", "mariadb:some-other-tag")
    );
}

#[test]
fn test_image_tag_format() {
    let doc = mariadb(
        "first: post
image: bitnami/mariadb
tag: 10.1.30-r1
persistence:
  enabled: false
",
    );
    let set = parse(&doc);
    let containers = set.get(MARIADB_KEY).unwrap().containers().unwrap();

    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, RELEASE_CONTAINER_NAME);
    assert_eq!(containers[0].shape, ImageShape::WithTag);
    assert_eq!(containers[0].image.to_string(), "bitnami/mariadb:10.1.30-r1");
}

#[test]
fn test_named_image_format() {
    let doc = mariadb(
        "db:
  first: post
  image: bitnami/mariadb:10.1.30-r1
  persistence:
    enabled: false
",
    );
    let patched = retag_single(&doc, "db");

    assert_eq!(
        patched,
        doc.replace("mariadb:10.1.30-r1", "mariadb:some-other-tag")
    );
}

#[test]
fn test_named_image_tag_format() {
    let doc = mariadb(
        "other:
  not: \"containing image\"
db:
  first: post
  image: bitnami/mariadb
  tag: 10.1.30-r1
  persistence:
    enabled: false
",
    );
    let patched = retag_single(&doc, "db");

    assert_eq!(
        patched,
        doc.replace("tag: 10.1.30-r1", "tag: some-other-tag")
    );
}

#[test]
fn test_image_object_format() {
    let doc = mariadb(
        "first: post
image:
  repository: bitnami/mariadb
  tag: 10.1.30-r1
persistence:
  enabled: false
",
    );
    let patched = retag_single(&doc, RELEASE_CONTAINER_NAME);

    assert_eq!(
        patched,
        doc.replace("tag: 10.1.30-r1", "tag: some-other-tag")
    );
}

#[test]
fn test_named_image_object_format() {
    let doc = mariadb(
        "other:
  not: \"containing image\"
db:
  first: post
  image:
    repository: bitnami/mariadb
    tag: 10.1.30-r1
  persistence:
    enabled: false
",
    );
    let patched = retag_single(&doc, "db");

    assert_eq!(
        patched,
        doc.replace("tag: 10.1.30-r1", "tag: some-other-tag")
    );
}

const ALL_FORMATS: &str = "---
apiVersion: helm.integrations.flux.weave.works/v1alpha2
kind: FluxHelmRelease
metadata:
  name: test
  namespace: test
spec:
  chartGitPath: test
  values:
    # top-level image
    image: repo/imageOne:tagOne

    # under .container, as image and tag entries
    AAA:
      image: repo/imageTwo
      tag: tagTwo

    # under .container.image, as repository and tag entries
    ZZZ:
      image:
        repository: repo/imageThree
        tag: tagThree
      persistence:
        enabled: false
";

#[test]
fn test_all_formats_in_one() {
    let set = parse(ALL_FORMATS);
    let containers = set
        .get("test:fluxhelmrelease/test")
        .unwrap()
        .containers()
        .unwrap();

    let found: Vec<(&str, String, ImageShape)> = containers
        .iter()
        .map(|c| (c.name.as_str(), c.image.to_string(), c.shape))
        .collect();
    assert_eq!(
        found,
        vec![
            (
                RELEASE_CONTAINER_NAME,
                "repo/imageOne:tagOne".to_string(),
                ImageShape::Bare
            ),
            ("AAA", "repo/imageTwo:tagTwo".to_string(), ImageShape::WithTag),
            (
                "ZZZ",
                "repo/imageThree:tagThree".to_string(),
                ImageShape::Nested
            ),
        ]
    );
}

#[test]
fn test_update_leaves_other_containers() {
    let mut set = parse(ALL_FORMATS);
    let release = workload(&mut set, "test:fluxhelmrelease/test");
    let before = release.containers().unwrap();

    release
        .set_container_image("AAA", &Image::parse("registry:5000/repo/imageTwo:v2").unwrap())
        .unwrap();

    let after = release.containers().unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1].image.to_string(), "registry:5000/repo/imageTwo:v2");
    assert_eq!(after[2], before[2]);

    let bytes = set.get("test:fluxhelmrelease/test").unwrap().bytes();
    assert_eq!(
        bytes,
        ALL_FORMATS
            .trim_start_matches("---\n")
            .replace("image: repo/imageTwo\n", "image: registry:5000/repo/imageTwo\n")
            .replace("tag: tagTwo", "tag: v2")
    );
}

#[test]
fn test_unknown_container() {
    let mut set = parse(ALL_FORMATS);
    let release = workload(&mut set, "test:fluxhelmrelease/test");

    let err = release
        .set_container_image("missing", &Image::parse("repo/x:1").unwrap())
        .unwrap_err();
    assert!(matches!(err, ManifestError::ContainerNotFound { .. }));
    assert!(err.is_not_found());

    assert_eq!(
        set.get("test:fluxhelmrelease/test").unwrap().bytes(),
        ALL_FORMATS.trim_start_matches("---\n")
    );
}

#[test]
fn test_quoting_is_preserved() {
    let doc = mariadb(
        "db:
  image: 'bitnami/mariadb'
  tag: \"10.1\"
web:
  image:
    repository: nginx
    tag: '1.25'
",
    );
    let mut set = parse(&doc);
    let release = workload(&mut set, MARIADB_KEY);

    release
        .set_container_image("db", &Image::parse("bitnami/mariadb:10.3").unwrap())
        .unwrap();
    release
        .set_container_image("web", &Image::parse("nginx:1.27").unwrap())
        .unwrap();

    let expected = doc
        .replace("tag: \"10.1\"", "tag: \"10.3\"")
        .replace("tag: '1.25'", "tag: '1.27'");
    assert_eq!(set.get(MARIADB_KEY).unwrap().bytes(), expected);
}

#[test]
fn test_plain_tag_that_would_decode_as_number_is_quoted() {
    let doc = mariadb("image: postgres\ntag: latest\n");
    let mut set = parse(&doc);
    let release = workload(&mut set, MARIADB_KEY);

    release
        .set_container_image(RELEASE_CONTAINER_NAME, &Image::parse("postgres:1.10").unwrap())
        .unwrap();

    assert_eq!(release.containers().unwrap()[0].image.tag(), "1.10");
    assert_eq!(
        set.get(MARIADB_KEY).unwrap().bytes(),
        doc.replace("tag: latest", "tag: \"1.10\"")
    );
}

#[test]
fn test_crlf_document() {
    let doc = mariadb("db:\n  image:\n    repository: nginx\n  port: 80\n").replace('\n', "\r\n");
    let mut set = parse(&doc);
    let release = workload(&mut set, MARIADB_KEY);

    release
        .set_container_image("db", &Image::parse("nginx:stable").unwrap())
        .unwrap();

    assert_eq!(
        set.get(MARIADB_KEY).unwrap().bytes(),
        doc.replace(
            "repository: nginx\r\n",
            "repository: nginx\r\n        tag: stable\r\n"
        )
    );
}

#[test]
fn test_identity_errors() {
    let doc = mariadb("image: a:1\n");
    let twice = format!("{doc}---\n{doc}");
    assert!(matches!(
        parse_multidoc(twice.as_bytes(), "test"),
        Err(ManifestError::DuplicateResource { .. })
    ));

    let nameless = "kind: FluxHelmRelease\nmetadata:\n  namespace: maria\n";
    assert!(matches!(
        parse_multidoc(nameless.as_bytes(), "test"),
        Err(ManifestError::MalformedManifest { .. })
    ));
}

#[test]
fn test_malformed_image_fails_discovery_only() {
    let doc = mariadb("image:\n  - not\n  - a reference\n");
    let set = parse(&doc);
    let resource = set.get(MARIADB_KEY).unwrap();

    assert!(matches!(resource, Resource::HelmRelease(_)));
    assert!(matches!(
        resource.containers(),
        Err(ManifestError::MalformedReference { .. })
    ));
}

#[test]
fn test_stream_update_keeps_other_documents() {
    let service = |name: &str| {
        format!("# {name}\napiVersion: v1\nkind: Service\nmetadata:\n  name: {name}\n  namespace: maria\n")
    };
    let release = mariadb("image: bitnami/mariadb:10.1.30-r1 # pinned\n");
    let stream = format!(
        "{}---\n{}...\n---\n{}",
        service("db-a"),
        release,
        service("db-b")
    );

    let updated = update_container_image(
        stream.as_bytes(),
        "test",
        MARIADB_KEY,
        RELEASE_CONTAINER_NAME,
        &Image::parse("bitnami/mariadb:10.3.9").unwrap(),
    )
    .unwrap();

    assert_eq!(updated, stream.replace("mariadb:10.1.30-r1", "mariadb:10.3.9"));
    assert_eq!(parse_multidoc(updated.as_bytes(), "test").unwrap().len(), 3);
}
