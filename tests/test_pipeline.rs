// Pipeline tests: composition behind the codec interface, joint flow
// control, end-of-stream only after every stage finishes, and nesting.

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use streamflate::async_reader::AsyncTransformReader;
    use streamflate::codec::{make_decoder, make_encoder, Codec, FinishStatus, Format};
    use streamflate::config::Config;
    use streamflate::error::Error;
    use streamflate::pipeline::Pipeline;
    use streamflate::reader::{decode_all, encode_all, TransformReader};
    use streamflate::session::State;
    use streamflate::source::{ChunkSource, SliceSource, TraceEvent, TraceSource};

    // ------------ Helpers ------------

    fn sample_bytes(len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(0x91be);
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        data
    }

    fn config(format: Format) -> Config {
        Config { format, ..Config::default() }
    }

    /// encode-then-decode pair for one format.
    fn enc_dec(format: Format) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.push(make_encoder(&config(format)));
        pipeline.push(make_decoder(&config(format)));
        pipeline
    }

    fn drive_read<S, C>(reader: &mut TransformReader<S, C>, dest_size: usize) -> Vec<u8>
    where
        S: ChunkSource,
        C: Codec,
    {
        let mut out = Vec::new();
        let mut buf = vec![0u8; dest_size];
        loop {
            let n = reader.read(&mut buf).expect("read should succeed");
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    // ------------ Composition ------------

    #[test]
    fn empty_pipeline_passes_bytes_through() {
        let data = sample_bytes(5000);
        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), Pipeline::new(), 64).unwrap();
        let out = drive_read(&mut reader, 13);
        assert_eq!(out, data);
        assert_eq!(reader.state(), State::Done);
    }

    #[test]
    fn encode_then_decode_pipeline_is_identity() {
        let data = sample_bytes(1200);
        for format in [Format::Zlib, Format::Gzip] {
            let mut reader =
                TransformReader::with_chunk_size(SliceSource::new(&data), enc_dec(format), 17)
                    .unwrap();
            let out = drive_read(&mut reader, 19);
            assert_eq!(out, data, "format {:?}", format);
        }
    }

    #[test]
    fn single_stage_pipeline_matches_plain_codec() {
        let data = sample_bytes(2000);
        let mut pipeline = Pipeline::new();
        pipeline.push(make_encoder(&config(Format::Gzip)));

        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), pipeline, 32).unwrap();
        let piped = drive_read(&mut reader, 48);

        let plain = encode_all(&data, config(Format::Gzip)).unwrap();
        assert_eq!(piped, plain, "one stage must behave like the codec alone");
    }

    #[test]
    fn pipeline_matches_two_independent_passes() {
        let data = sample_bytes(1800);
        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), enc_dec(Format::Zlib), 25)
                .unwrap();
        let chained = drive_read(&mut reader, 40);

        let encoded = encode_all(&data, config(Format::Zlib)).unwrap();
        let two_pass = decode_all(&encoded, config(Format::Zlib)).unwrap();
        assert_eq!(chained, two_pass);
        assert_eq!(chained, data);
    }

    #[test]
    fn four_stage_chain_is_identity() {
        let data = sample_bytes(900);
        let mut pipeline = Pipeline::new();
        pipeline.push(make_encoder(&config(Format::Zlib)));
        pipeline.push(make_decoder(&config(Format::Zlib)));
        pipeline.push(make_encoder(&config(Format::Gzip)));
        pipeline.push(make_decoder(&config(Format::Gzip)));

        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), pipeline, 23).unwrap();
        let out = drive_read(&mut reader, 31);
        assert_eq!(out, data);
    }

    #[test]
    fn nested_pipelines_compose() {
        let data = sample_bytes(900);
        let mut inner_enc = Pipeline::new();
        inner_enc.push(make_encoder(&config(Format::Gzip)));
        let mut inner_dec = Pipeline::new();
        inner_dec.push(make_decoder(&config(Format::Gzip)));

        let mut outer = Pipeline::new();
        outer.push(Box::new(inner_enc));
        outer.push(Box::new(inner_dec));
        assert_eq!(outer.len(), 2);

        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), outer, 41).unwrap();
        let out = drive_read(&mut reader, 29);
        assert_eq!(out, data);
    }

    // ------------ Flow control ------------

    #[test]
    fn one_byte_joints_still_flow() {
        let data = sample_bytes(300);
        let mut pipeline = Pipeline::with_joint_size(1).unwrap();
        pipeline.push(make_encoder(&config(Format::Gzip)));
        pipeline.push(make_decoder(&config(Format::Gzip)));

        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), pipeline, 16).unwrap();
        let out = drive_read(&mut reader, 7);
        assert_eq!(out, data, "a one-byte joint must only slow things down");
    }

    #[test]
    fn joint_size_is_validated() {
        assert!(matches!(Pipeline::with_joint_size(0), Err(Error::Config(_))));
    }

    // ------------ Completion ------------

    #[test]
    fn stream_end_requires_every_stage_done() {
        let data = sample_bytes(512);
        let mut pipeline = enc_dec(Format::Zlib);
        pipeline.init().unwrap();

        let mut out = vec![0u8; 8192];
        let outcome = pipeline.step(&data, &mut out).unwrap();
        assert_eq!(outcome.consumed, data.len());

        let mut tail = Vec::from(&out[..outcome.produced]);
        loop {
            let fin = pipeline.finish(&mut out).unwrap();
            tail.extend_from_slice(&out[..fin.produced]);
            if fin.status == FinishStatus::StreamEnd {
                break;
            }
        }
        assert_eq!(tail, data, "finish must flush both stages before stream end");
    }

    #[test]
    fn zero_length_input_through_pipeline() {
        for format in [Format::Zlib, Format::Gzip] {
            let mut reader =
                TransformReader::with_chunk_size(SliceSource::new(&[]), enc_dec(format), 16)
                    .unwrap();
            let out = drive_read(&mut reader, 8);
            assert!(out.is_empty(), "format {:?}", format);
            assert_eq!(reader.state(), State::Done);
        }
    }

    // ------------ Corruption ------------

    #[test]
    fn corruption_between_stages_surfaces() {
        // A zlib body handed to a gzip stage cannot parse.
        let data = sample_bytes(700);
        let mut pipeline = Pipeline::new();
        pipeline.push(make_encoder(&config(Format::Zlib)));
        pipeline.push(make_decoder(&config(Format::Gzip)));

        let mut reader =
            TransformReader::with_chunk_size(SliceSource::new(&data), pipeline, 16).unwrap();
        let mut buf = vec![0u8; 64];
        let err = loop {
            match reader.read(&mut buf) {
                Ok(0) => panic!("mismatched stages must not end cleanly"),
                Ok(_) => continue,
                Err(e) => break e,
            }
        };
        assert!(matches!(err, Error::Corrupt(_)), "got {:?}", err);
        assert_eq!(reader.state(), State::Done);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    // ------------ Async drive ------------

    #[test]
    fn async_drive_matches_sync_drive() {
        let data = sample_bytes(1500);
        let chunks: Vec<Vec<u8>> = data.chunks(97).map(|c| c.to_vec()).collect();
        let mut events: Vec<TraceEvent> = Vec::new();
        for (i, chunk) in chunks.into_iter().enumerate() {
            if i % 2 == 1 {
                events.push(TraceEvent::Pending);
            }
            events.push(TraceEvent::Data(chunk));
        }
        events.push(TraceEvent::Eof);

        let mut sync_reader = TransformReader::with_chunk_size(
            TraceSource::new(events.clone()),
            enc_dec(Format::Gzip),
            48,
        )
        .unwrap();
        let sync_out = drive_read(&mut sync_reader, 33);

        let mut async_reader = AsyncTransformReader::with_chunk_size(
            TraceSource::new(events),
            enc_dec(Format::Gzip),
            48,
        )
        .unwrap();
        let async_out = block_on(async_reader.read_to_vec()).unwrap();

        assert_eq!(sync_out, data);
        assert_eq!(async_out, sync_out, "both drivers must agree on pipeline output");
    }
}
