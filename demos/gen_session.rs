//! Generate validation output for a short synthetic push-up session

fn main() {
    let json = r#"[
        { "landmarks": [], "confidence": 0.95, "timestamp": 0 },
        { "landmarks": [], "confidence": 0.95, "timestamp": 33 },
        { "landmarks": [], "confidence": 0.40, "timestamp": 66 },
        { "landmarks": [], "confidence": 0.95, "timestamp": 99 }
    ]"#;

    match repform::schema::FrameAdapter::parse_array(json) {
        Ok(frames) => {
            let mut processor =
                repform::SessionProcessor::new(repform::ExerciseKind::PushUp);
            for frame in &frames {
                let result = processor.process(frame);
                match serde_json::to_string(&result) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("Error: {e:?}"),
                }
            }
            match processor.summary_json() {
                Ok(summary) => print!("{summary}"),
                Err(e) => eprintln!("Error: {e:?}"),
            }
        }
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
