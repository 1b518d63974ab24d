use super::file_name;
use crate::adapters::outbound::filesystem::read_manifest;
use crate::ports::outbound::ManifestParser;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager, Scope, LATEST_VERSION};
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Version recorded for a Maven dependency that declares none
const UNKNOWN_VERSION: &str = "unknown";

/// `implementation 'g:a:v'`, `testImplementation("g:a:v")`, `api "g:a:v@aar"`
static GRADLE_STRING_NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)\b([A-Za-z]*(?:[Ii]mplementation|[Aa]pi|[Cc]ompile|[Cc]ompileOnly|[Rr]untimeOnly|AnnotationProcessor|annotationProcessor|kapt|classpath))\s*\(?\s*["']([^:"'\s]+):([^:"'\s]+):([^:"'\s@]+)[^"']*["']"#,
    )
    .expect("static regex")
});

/// `implementation group: 'g', name: 'a', version: 'v'`
static GRADLE_MAP_NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)\b([A-Za-z]+)\s*\(?\s*group\s*[:=]\s*["']([^"']+)["']\s*,\s*name\s*[:=]\s*["']([^"']+)["']\s*,\s*version\s*[:=]\s*["']([^"']+)["']"#,
    )
    .expect("static regex")
});

/// Parser for Maven and Gradle projects.
///
/// Neither ecosystem is resolved online: Maven has no standard lockfile and
/// Gradle's dependency tree needs the build itself.
pub struct JavaParser {
    manager: PackageManager,
}

#[derive(Debug, Default)]
struct PomDependency {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
    scope: Option<String>,
    optional: bool,
}

#[derive(Debug, Default)]
struct Pom {
    properties: HashMap<String, String>,
    project_version: Option<String>,
    project_group: Option<String>,
    parent_version: Option<String>,
    parent_group: Option<String>,
    dependencies: Vec<PomDependency>,
}

/// Bound on nested `${...}` references inside property values
const MAX_INTERPOLATION_DEPTH: usize = 5;

impl Pom {
    /// Replaces `${name}` references using `<properties>` and the project
    /// coordinates. A reference that stays unresolved yields `None`.
    fn interpolate(&self, value: &str) -> Option<String> {
        self.interpolate_at(value, 0)
    }

    fn interpolate_at(&self, value: &str, depth: usize) -> Option<String> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return None;
        }
        let mut result = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let end = rest[start..].find('}')? + start;
            let resolved = self.property(&rest[start + 2..end])?;
            result.push_str(&self.interpolate_at(&resolved, depth + 1)?);
            rest = &rest[end + 1..];
        }
        result.push_str(rest);
        Some(result)
    }

    fn property(&self, key: &str) -> Option<String> {
        let builtin = match key {
            "project.version" | "pom.version" | "version" => {
                self.project_version.clone().or_else(|| self.parent_version.clone())
            }
            "project.groupId" | "pom.groupId" => {
                self.project_group.clone().or_else(|| self.parent_group.clone())
            }
            "project.parent.version" => self.parent_version.clone(),
            _ => None,
        };
        builtin.or_else(|| self.properties.get(key).cloned())
    }
}

fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    name.rfind(':')
        .map_or_else(|| name.to_string(), |idx| name[idx + 1..].to_string())
}

fn parse_pom(content: &str) -> Result<Pom, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut current: Option<PomDependency> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = local_name(e.name().as_ref());
                if name == "dependency" && path_is(&stack, &["project", "dependencies"]) {
                    current = Some(PomDependency::default());
                }
                stack.push(name);
                text.clear();
            }
            Event::Text(ref e) => {
                text.push_str(&e.unescape().unwrap_or_default());
            }
            Event::CData(ref e) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(_) => {
                let value = text.trim().to_string();
                text.clear();
                let Some(name) = stack.pop() else {
                    continue;
                };
                let parents: Vec<&str> = stack.iter().map(String::as_str).collect();
                match (parents.as_slice(), name.as_str()) {
                    (["project", "properties"], key) => {
                        pom.properties.insert(key.to_string(), value);
                    }
                    (["project"], "version") => pom.project_version = Some(value),
                    (["project"], "groupId") => pom.project_group = Some(value),
                    (["project", "parent"], "version") => pom.parent_version = Some(value),
                    (["project", "parent"], "groupId") => pom.parent_group = Some(value),
                    (["project", "dependencies", "dependency"], field) => {
                        if let Some(dep) = current.as_mut() {
                            match field {
                                "groupId" => dep.group_id = value,
                                "artifactId" => dep.artifact_id = value,
                                "version" => dep.version = Some(value),
                                "scope" => dep.scope = Some(value),
                                "optional" => dep.optional = value == "true",
                                _ => {}
                            }
                        }
                    }
                    (["project", "dependencies"], "dependency") => {
                        if let Some(dep) = current.take() {
                            pom.dependencies.push(dep);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(pom)
}

fn path_is(stack: &[String], expected: &[&str]) -> bool {
    stack.len() == expected.len() && stack.iter().zip(expected).all(|(a, b)| a == b)
}

fn is_test_configuration(configuration: &str) -> bool {
    configuration.starts_with("test") || configuration.starts_with("androidTest")
}

impl JavaParser {
    pub fn new(manager: PackageManager) -> Self {
        Self { manager }
    }

    fn package(&self, group: &str, artifact: &str, version: impl Into<String>) -> Package {
        Package::new(artifact, version, self.manager).with_namespace(group)
    }

    fn maven_dependencies(&self, pom: &Pom) -> Vec<Dependency> {
        pom.dependencies
            .iter()
            .filter(|d| !d.group_id.is_empty() && !d.artifact_id.is_empty())
            .map(|d| {
                let group = pom.interpolate(&d.group_id).unwrap_or_else(|| d.group_id.clone());
                let version = d
                    .version
                    .as_deref()
                    .and_then(|v| pom.interpolate(v))
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
                let package = self.package(&group, &d.artifact_id, version);
                match d.scope.as_deref() {
                    Some("test") | Some("provided") => Dependency::dev(package),
                    _ if d.optional => Dependency::optional(package),
                    _ => Dependency::direct(package),
                }
            })
            .collect()
    }

    fn gradle_dependencies(&self, content: &str) -> Vec<Dependency> {
        let mut found: Vec<(usize, Dependency)> = Vec::new();
        for pattern in [&*GRADLE_STRING_NOTATION, &*GRADLE_MAP_NOTATION] {
            for caps in pattern.captures_iter(content) {
                let (Some(whole), Some(config), Some(group), Some(artifact), Some(version)) =
                    (caps.get(0), caps.get(1), caps.get(2), caps.get(3), caps.get(4))
                else {
                    continue;
                };
                let version = if version.as_str().contains('$') {
                    LATEST_VERSION
                } else {
                    version.as_str()
                };
                let package = self.package(group.as_str(), artifact.as_str(), version);
                let dep = if is_test_configuration(config.as_str()) {
                    Dependency::dev(package)
                } else {
                    Dependency::direct(package)
                };
                found.push((whole.start(), dep));
            }
        }
        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, dep)| dep).collect()
    }

    /// `group:artifact:version=classpath1,classpath2` per line.
    fn gradle_lockfile(&self, content: &str) -> Vec<Dependency> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (coordinates, classpaths) = line.split_once('=').unwrap_or((line, ""));
                let mut parts = coordinates.splitn(3, ':');
                let (group, artifact, version) = (parts.next()?, parts.next()?, parts.next()?);
                let mut dep = Dependency::unattributed(self.package(group, artifact, version.trim()));
                let test_only = !classpaths.is_empty()
                    && classpaths.split(',').all(|c| is_test_configuration(c.trim()));
                if test_only {
                    dep.scope = Scope::Development;
                }
                Some(dep)
            })
            .collect()
    }
}

#[async_trait]
impl ManifestParser for JavaParser {
    fn name(&self) -> &'static str {
        "java"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::Maven, PackageManager::Gradle]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "pom.xml" => {
                let content = read_manifest(path).await?;
                let pom = parse_pom(&content).map_err(|e| ParseError::malformed(path, e))?;
                Ok(self.maven_dependencies(&pom))
            }
            "build.gradle" | "build.gradle.kts" => {
                let content = read_manifest(path).await?;
                Ok(self.gradle_dependencies(&content))
            }
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "gradle.lockfile" => {
                let content = read_manifest(path).await?;
                Ok(self.gradle_lockfile(&content))
            }
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::DependencyType;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>demo</artifactId>
  <version>1.2.0</version>
  <properties>
    <jackson.version>2.15.2</jackson.version>
  </properties>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.managed</groupId>
        <artifactId>bom</artifactId>
        <version>9.9.9</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>com.fasterxml.jackson.core</groupId>
      <artifactId>jackson-databind</artifactId>
      <version>${jackson.version}</version>
    </dependency>
    <dependency>
      <groupId>${project.groupId}</groupId>
      <artifactId>demo-common</artifactId>
      <version>${project.version}</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13.2</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
    </dependency>
  </dependencies>
</project>"#;

    #[tokio::test]
    async fn test_pom_with_properties() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "pom.xml", POM);
        let deps = JavaParser::new(PackageManager::Maven).parse_manifest(&path).await;
        let purls: Vec<&str> = deps.iter().map(|d| d.purl()).collect();
        assert_eq!(
            purls,
            vec![
                "pkg:maven/com.fasterxml.jackson.core/jackson-databind@2.15.2",
                "pkg:maven/com.example/demo-common@1.2.0",
                "pkg:maven/junit/junit@4.13.2",
                "pkg:maven/org.slf4j/slf4j-api@unknown",
            ]
        );
        assert_eq!(deps[2].dependency_type, DependencyType::Dev);
        assert!(deps.iter().all(|d| d.depth == 0));
    }

    #[tokio::test]
    async fn test_malformed_pom_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "pom.xml", "<project><dependencies></project>");
        assert!(JavaParser::new(PackageManager::Maven).parse_manifest(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_gradle_groovy_and_kotlin() {
        let dir = TempDir::new().unwrap();
        let groovy = write(
            &dir,
            "build.gradle",
            r#"
dependencies {
    implementation 'org.springframework.boot:spring-boot-starter-web:3.1.4'
    api "com.google.guava:guava:32.1.2-jre"
    testImplementation 'org.junit.jupiter:junit-jupiter:5.10.0'
    compileOnly group: 'org.projectlombok', name: 'lombok', version: '1.18.30'
}
"#,
        );
        let parser = JavaParser::new(PackageManager::Gradle);
        let deps = parser.parse_manifest(&groovy).await;
        let names: Vec<&str> = deps.iter().map(|d| d.package.name()).collect();
        assert_eq!(names, vec!["spring-boot-starter-web", "guava", "junit-jupiter", "lombok"]);
        assert_eq!(deps[1].package.version(), "32.1.2-jre");
        assert_eq!(deps[2].dependency_type, DependencyType::Dev);
        assert_eq!(deps[0].purl(), "pkg:gradle/org.springframework.boot/spring-boot-starter-web@3.1.4");

        let kotlin = write(
            &dir,
            "build.gradle.kts",
            "dependencies {\n    implementation(\"io.ktor:ktor-server-core:2.3.5\")\n    testImplementation(kotlin(\"test\"))\n}\n",
        );
        let deps = parser.parse_manifest(&kotlin).await;
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].package.name(), "ktor-server-core");
    }

    #[tokio::test]
    async fn test_gradle_lockfile_is_unattributed() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "gradle.lockfile",
            "# This is a Gradle generated file\ncom.google.guava:guava:32.1.2-jre=compileClasspath,runtimeClasspath\norg.junit.jupiter:junit-jupiter:5.10.0=testCompileClasspath,testRuntimeClasspath\nempty=annotationProcessor\n",
        );
        let deps = JavaParser::new(PackageManager::Gradle).parse_lockfile(&path).await.unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| d.dependency_type == DependencyType::Transitive));
        assert_eq!(deps[0].scope, Scope::Runtime);
        assert_eq!(deps[1].scope, Scope::Development);
    }

    #[tokio::test]
    async fn test_maven_lock_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "maven.lock", "");
        let err = JavaParser::new(PackageManager::Maven).parse_lockfile(&path).await.unwrap_err();
        assert!(err.is_unsupported());
    }
}
