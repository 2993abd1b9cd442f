use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use skyview_gen::{
    GenerateError, GenerationClient, GenerationRequest, GenerationResponse, Generator,
    GeneratorChain, GeneratorMode, LocalGenerator, NacaProfile, WingModel, read_glb_json,
};
use skyview_studio::InteractionStore;

/// Serves exactly one HTTP response and hands back the raw request.
fn one_shot(status: &str, body: &str) -> Result<(String, JoinHandle<String>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let base = format!("http://{}", listener.local_addr()?);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return String::new();
        };
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            request.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }
        let mut body = vec![0; content_length];
        if reader.read_exact(&mut body).is_ok() {
            request.push_str(&String::from_utf8_lossy(&body));
        }
        let mut stream = reader.into_inner();
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        request
    });
    Ok((base, handle))
}

fn join(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

#[test]
fn blank_prompt_never_reaches_the_network() {
    assert!(matches!(
        GenerationRequest::from_prompt("  ", GeneratorMode::Remote),
        Err(GenerateError::EmptyPrompt)
    ));
}

#[test]
fn client_posts_parameters_and_reads_url() -> Result<()> {
    let (base, server) = one_shot(
        "200 OK",
        r#"{"viewer_url": "http://127.0.0.1:8000/models/wing_1.glb", "source": "local", "total_span": 30}"#,
    )?;
    let client = GenerationClient::new(format!("{base}/"), Duration::from_secs(5))?;
    let request = GenerationRequest::from_prompt("30m wingspan, 25 degree sweep", GeneratorMode::Auto)?;

    let response = client.generate(&request)?;
    let raw = join(server);

    assert!(raw.starts_with("POST /generate "));
    assert!(raw.contains("\"semi_span\":15.0"));
    assert!(raw.contains("\"generator\":\"auto\""));
    assert_eq!(response.asset_url(), Some("http://127.0.0.1:8000/models/wing_1.glb"));
    assert_eq!(response.total_span, Some(30.0));
    Ok(())
}

#[test]
fn service_errors_carry_status_and_detail() -> Result<()> {
    let (base, server) = one_shot("502 Bad Gateway", r#"{"detail": "Remote generation failed"}"#)?;
    let client = GenerationClient::new(base, Duration::from_secs(5))?;
    let request = GenerationRequest::from_prompt("a wing", GeneratorMode::Remote)?;

    let result = client.generate(&request);
    join(server);
    match result {
        Err(GenerateError::Service { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "Remote generation failed");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn response_without_url_is_rejected() -> Result<()> {
    let (base, server) = one_shot("200 OK", r#"{"message": "queued"}"#)?;
    let client = GenerationClient::new(base, Duration::from_secs(5))?;
    let request = GenerationRequest::from_prompt("a wing", GeneratorMode::Auto)?;

    let result = client.generate(&request);
    join(server);
    assert!(matches!(result, Err(GenerateError::MissingAssetUrl)));
    Ok(())
}

#[test]
fn unreachable_asset_fails_verification() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/models/missing.glb", listener.local_addr()?);
    drop(listener);
    let client = GenerationClient::new("http://127.0.0.1:9", Duration::from_secs(2))?;
    assert!(!client.verify_asset(&url));
    Ok(())
}

struct Failing(GeneratorMode);

impl Generator for Failing {
    fn mode(&self) -> GeneratorMode {
        self.0
    }

    fn generate(&self, _: &GenerationRequest) -> skyview_gen::Result<GenerationResponse> {
        Err(GenerateError::NotConfigured(self.0.as_str()))
    }
}

#[test]
fn auto_mode_falls_back_to_local_wing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let chain = GeneratorChain::new(vec![
        Box::new(Failing(GeneratorMode::Remote)),
        Box::new(Failing(GeneratorMode::Dreamfusion)),
        Box::new(LocalGenerator::new(dir.path(), "http://localhost:8000/")),
    ]);
    let request = GenerationRequest::from_prompt("30m wingspan, 25 degree sweep", GeneratorMode::Auto)?;

    let response = chain.run(&request)?;
    assert_eq!(response.source.as_deref(), Some("local"));
    assert_eq!(response.total_span, Some(30.0));
    let url = response.asset_url().unwrap_or_default();
    assert!(url.starts_with("http://localhost:8000/models/wing_"));

    let file_name = url.rsplit('/').next().unwrap_or_default();
    let bytes = std::fs::read(dir.path().join(file_name))?;
    let document = read_glb_json(&bytes)?;
    assert_eq!(document["meshes"].as_array().map(Vec::len), Some(2));
    assert_eq!(document["nodes"][0]["children"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn explicit_mode_does_not_fall_back() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let chain = GeneratorChain::new(vec![
        Box::new(Failing(GeneratorMode::Remote)),
        Box::new(LocalGenerator::new(dir.path(), "http://localhost:8000")),
    ]);
    let request = GenerationRequest::from_prompt("a wing", GeneratorMode::Remote)?;
    assert!(matches!(
        chain.run(&request),
        Err(GenerateError::NotConfigured("remote"))
    ));

    let request = GenerationRequest::from_prompt("a wing", GeneratorMode::Dreamfusion)?;
    assert!(matches!(
        chain.run(&request),
        Err(GenerateError::NotConfigured("dreamfusion"))
    ));
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn every_failure_is_reported() -> Result<()> {
    let chain = GeneratorChain::new(vec![
        Box::new(Failing(GeneratorMode::Remote)),
        Box::new(Failing(GeneratorMode::Local)),
    ]);
    let request = GenerationRequest::from_prompt("a wing", GeneratorMode::Auto)?;
    match chain.run(&request) {
        Err(GenerateError::AllGeneratorsFailed(message)) => {
            assert!(message.contains("remote"));
            assert!(message.contains("local"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn generated_wing_loads_into_the_studio() -> Result<()> {
    let request = GenerationRequest::from_prompt("30m wingspan, 25 degree sweep", GeneratorMode::Local)?;
    let wing = WingModel::build(&request.parameters, NacaProfile::default())?;
    let mut store = InteractionStore::default();

    let model = store.load_model(wing.to_model_spec())?;
    assert_eq!(store.scene().descendants(model).len(), 2);
    let z = store.cut().ranges().z;
    assert!((z.min + 15.0).abs() < 1e-9 && (z.max - 15.0).abs() < 1e-9);
    Ok(())
}
